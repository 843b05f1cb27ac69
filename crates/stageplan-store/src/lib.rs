//! Data model and file-backed persistence for stage plans.
//!
//! - [`models`]: stages, plan status, stage ranges, plans, and plan events.
//! - [`config`]: where the plan store lives on disk.
//! - [`file`]: loading and saving the JSON store snapshot.
//! - [`lock`]: the advisory lock held across a load-change-save sequence.

pub mod config;
pub mod file;
pub mod lock;
pub mod models;
