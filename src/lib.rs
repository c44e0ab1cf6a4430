//! evalboard: terminal dashboard for a text evaluation backend.
//!
//! Submits text to a remote service that scores it with a gibberish
//! classifier and a hallucination model, and shows the latest result, the
//! evaluation history and a score trend chart.

pub mod activity;
pub mod api;
pub mod cli;
pub mod config;
pub mod render;
pub mod session;
pub mod state;
pub mod theme;
