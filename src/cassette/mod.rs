//! Cassette record/replay infrastructure for deterministic testing.
//!
//! A cassette is a YAML file of recorded port interactions. Recording
//! wraps live adapters and captures every call; replaying serves the
//! recorded outputs back without touching the network or disk.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;
