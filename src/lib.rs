//! Multiping - Live multi-target ICMP reachability monitor
//!
//! This library provides the concurrent probing engine behind the `multiping`
//! binary: one independent probe loop per target, a shared adaptive delay,
//! a bounded admission gate for in-flight probes, non-blocking keyboard
//! control, and a serialized live table renderer.

pub mod monitor;
