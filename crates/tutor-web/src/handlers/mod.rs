//! HTTP handlers for all API routes.

pub mod generation;
pub mod language;
pub mod system;
