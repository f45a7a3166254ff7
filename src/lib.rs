//! fin-onboard — onboarding and risk-profiling wizard core.
//!
//! The backend computes every score; this crate sequences the steps,
//! validates payloads locally, submits them, and keeps the session
//! resumable across failures, restarts, and forced re-logins.

pub mod api;
pub mod config;
pub mod error;
pub mod store;
pub mod ui;
pub mod wizard;
