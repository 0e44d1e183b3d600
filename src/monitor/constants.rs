//! Constants used throughout the monitor

/// Maximum number of targets a single run may monitor
pub const MAX_TARGETS: usize = 20;

/// Number of probes allowed in flight at once, regardless of target count
pub const GATE_CAPACITY: usize = 5;

/// Default delay between probes of the same target, in seconds
pub const DEFAULT_DELAY_SECS: f64 = 0.5;

/// Lower bound for the inter-probe delay, in seconds
pub const MIN_DELAY_SECS: f64 = 0.25;

/// Upper bound for the inter-probe delay, in seconds
pub const MAX_DELAY_SECS: f64 = 2.5;

/// Delay change applied per '+'/'-' keypress, in seconds
pub const DELAY_STEP_SECS: f64 = 0.25;

/// Idle sleep of the orchestrator control loop in milliseconds
pub const CONTROL_POLL_INTERVAL_MS: u64 = 100;

/// Keyboard poll timeout of the input listener in milliseconds
pub const INPUT_POLL_INTERVAL_MS: u64 = 100;

/// Default reply timeout handed to the ping executable in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2000;

/// Extra time granted to the ping executable before it is killed
pub const PROBE_GRACE_MS: u64 = 1000;

/// Target list file used by the interactive menu and as a fallback
pub const DEFAULT_TARGET_FILE: &str = "ip_list.txt";

/// Left indent of every line in the rendered table
pub const TABLE_INDENT: usize = 5;

/// Width of the address column
pub const ADDRESS_COLUMN_WIDTH: usize = 35;

/// Width of the sent/received column
pub const SENT_RECV_COLUMN_WIDTH: usize = 12;

/// Width of the success percentage column
pub const SUCCESS_COLUMN_WIDTH: usize = 12;

/// Width of the latency column
pub const LATENCY_COLUMN_WIDTH: usize = 14;
