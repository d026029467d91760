//! tutor-web — JSON HTTP API for the tutor service.
//! Exposes:
//!   - Language detection and intent classification
//!   - Translation between English and four Indic languages
//!   - Answer, notes and quiz generation (remote first, local fallback)
//!   - Service status and CORS handling

pub mod cors;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
