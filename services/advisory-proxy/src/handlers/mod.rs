//! HTTP handlers for the advisory proxy.

pub mod advisory;
pub mod health;
