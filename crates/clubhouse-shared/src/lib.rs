//! # clubhouse-shared
//!
//! Identifiers, message and user records, the backend wire format and the
//! constants shared by the inbox engine and the client.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::ProtocolError;
pub use types::*;
