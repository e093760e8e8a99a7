//! Utils module - logging setup and helpers

pub mod logging;
