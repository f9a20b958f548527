//! Utility functions and helpers.

pub mod delimited;
pub mod fs;
pub mod http;
pub mod url;
