//! HTTP middleware for the Authgate API

mod gate;

pub use gate::{request_gate, AppState};
