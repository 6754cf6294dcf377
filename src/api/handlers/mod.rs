//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Job submission, status and run control handlers.
pub mod jobs;
/// Latest result display and download handlers.
pub mod results;
/// Liveness and editing-service probe handlers.
pub mod status;
