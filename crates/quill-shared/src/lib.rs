//! # Quill Shared
//!
//! Request and response types of the Quill HTTP API, usable by any client.

pub mod dto;
pub mod response;

pub use response::{Acknowledgement, ErrorResponse};
