pub mod app;
pub mod core;
pub mod discovery;
pub mod pipeline;
pub mod report;
