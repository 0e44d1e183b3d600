//! Monitor module for the multiping reachability tool

pub mod config;
pub mod constants;
pub mod delay;
pub mod display;
pub mod engine;
pub mod error;
pub mod gate;
pub mod input;
pub mod logging;
pub mod probe;
pub mod stats;
pub mod stop;
pub mod targets;
pub mod worker;

pub use config::Config;
pub use constants::*;
pub use delay::DelayController;
pub use display::{render_frame, Display, DisplayStyle};
pub use engine::{Monitor, MonitorReport, StopReason, WorkerFailure};
pub use error::{MonitorError, Result};
pub use gate::{ConcurrencyGate, GatePermit};
pub use input::{map_key, ControlInput, KeyAction, KeyboardListener};
pub use logging::{init_logging, init_logging_with_config};
pub use probe::{parse_latency_ms, ProbeOutcome, Prober, SystemPinger};
pub use stats::{StatsBoard, TargetSlot, TargetStats};
pub use stop::StopSignal;
pub use targets::{
    load_target_file, parse_target_list, prompt_targets, resolve_targets, validate_targets,
};
pub use worker::{Worker, WorkerReport, WorkerState};
