//! Request handlers for the Authgate API

pub mod auth;
pub mod callback;
pub mod pages;
