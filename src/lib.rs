//! sitepass library API
//!
//! Deterministic per-site passwords derived from a master password, plus the command-line
//! grammar, fingerprint and erasure pipeline used by the binary in main.rs.

pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod interrupt;
pub mod options;
pub mod output;
pub mod prompt;
pub mod securemem;

// Re-export commonly used types for convenience
pub use error::{Error, ErrorKind};
pub use securemem::SecretStore;
