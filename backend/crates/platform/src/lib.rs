//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Text sanitization for untrusted free text
//! - Hashing and encoding utilities (SHA-256, hex, Base64)
//! - Environment variable expansion for configuration text

pub mod crypto;
pub mod env;
pub mod sanitize;
