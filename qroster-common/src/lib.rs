//! # qroster Common Library
//!
//! Shared code for the qroster roster service:
//! - Record model and database initialization
//! - Configuration loading and root folder resolution
//! - External identifier generation
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod identifier;

pub use error::{Error, Result};
