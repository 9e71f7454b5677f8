#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod cursor;
mod envelope;
mod error;
mod header;
mod options;
mod tbs;

pub mod crypto;
mod verify;

pub use error::Error;
pub use header::HeaderSet;
pub use options::VerifyOptions;

pub use crypto::{PublicKeyVerifier, RingVerifier};
pub use verify::{verify, verify_with};

/// The maximum number of unknown or critical header labels this core will
/// track per header map, per label kind (integer and byte-string labels
/// each get their own budget). Exceeding it is `Error::TooManyHeaders`
/// rather than an unbounded allocation.
pub const HEADER_LIST_MAX: usize = 10;
