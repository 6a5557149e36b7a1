//! Reqwest-backed implementations of the wizard's gateway traits.

mod client;

pub use client::{ApiClient, AuthTokens};
