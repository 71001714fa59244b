//! Core services and infrastructure

pub mod config;
pub mod error_handling;
pub mod gate;
pub mod locator;
pub mod logging;
pub mod retry;
pub mod version;
