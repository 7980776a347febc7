//! Host shell for the moodboard canvas engine.
//!
//! Wraps the synchronous [`canvas`] engine in a tokio board session: remote
//! collaborators behind async traits, a per-board sync worker that owns every
//! write, env-driven configuration, and user notifications.

pub mod config;
pub mod notify;
pub mod remote;
pub mod services;

pub use services::session::{BoardSession, Collaborators, SessionError};
pub use services::sync::FlushReport;
