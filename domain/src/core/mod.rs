//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`string`]: character-safe truncation helpers used by prompt building

pub mod error;
pub mod string;
