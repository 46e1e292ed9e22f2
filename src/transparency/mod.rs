//! Transparency module for the Workflow Sensor Agent.
//!
//! Tracks how much the agent has observed and produced so users can see
//! what is being collected without the log itself holding personal data.

pub mod log;

pub use log::{
    create_shared_log, create_shared_log_with_persistence, SharedTransparencyLog, TransparencyLog,
    TransparencyStats,
};
