//! Core components for signing API requests.
//!
//! This crate provides the service-independent building blocks used by
//! `awsign-v4`:
//!
//! - [`Error`] and [`ErrorKind`]: the error type shared by every signer.
//! - [`SigningRequest`]: a borrowed-then-owned view of [`http::request::Parts`]
//!   that canonicalizers can freely inspect without touching the caller's request.
//! - [`Env`]: environment access used while loading configuration.
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time formatting and pluggable time sources
//! - [`utils`]: General utilities including data redaction
//!
//! ## Example
//!
//! ```
//! use awsign_core::hash::hex_sha256;
//! use awsign_core::time::SigningTime;
//!
//! let time = SigningTime::from_unix(0).expect("epoch is in range");
//! assert_eq!(time.iso8601(), "19700101T000000Z");
//! assert_eq!(time.short_date(), "19700101");
//! assert_eq!(
//!     hex_sha256(b""),
//!     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
//! );
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod env;
pub use env::Env;
pub use env::OsEnv;
pub use env::StaticEnv;
mod error;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
mod request;
pub use request::OpaquePath;
pub use request::SigningRequest;
