// src/lib.rs

//! linkaudit library
//!
//! Harvests and resolves candidate links for platforms that cannot be
//! crawled from a single entry point, hands them to an external validation
//! oracle, and correlates the oracle's findings back to the content that
//! referenced each broken URL.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
