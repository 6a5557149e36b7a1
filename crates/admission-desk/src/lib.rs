//! Core library for the admissions intake service.
//!
//! The interesting machinery lives under [`workflows::enrollment`]: a
//! multi-step applicant wizard with a single-owner draft store, per-field
//! upload coordination, declarative step validation, and assembly of the
//! backend submission payload. Everything else here is the surrounding
//! plumbing: configuration, telemetry, the HTTP error surface, and the
//! reqwest client used to talk to the admissions backend.

pub mod backend;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
