//! Core domain types and shared logic for the stash file service.
//!
//! This crate defines the canonical data model used across all other crates:
//! - File identifiers and the blob key scheme
//! - Access levels and capability tokens
//! - MIME type to file extension mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod file;

pub use error::{Error, Result};
pub use file::{extension_for_mime, AccessLevel, AccessToken, FileId};
