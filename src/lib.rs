//! Wayfarer character motion library
//!
//! Rigid-body locomotion, crossfaded animation and the state machine that
//! binds them, plus a headless session for driving characters frame by frame.

pub mod config;
pub mod game;
pub mod logging;
