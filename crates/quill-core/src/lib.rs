//! # Quill Core
//!
//! The domain layer of Quill: posts, excerpts, and the ports that
//! infrastructure implements. No I/O happens in this crate.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::{DomainError, RepoError};
