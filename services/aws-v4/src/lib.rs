//! AWS SigV4 signer.
//!
//! Signs [`http::request::Parts`] either in place with an `Authorization`
//! header ([`Signer::sign`]) or into a presigned url ([`Signer::presign`]).
//!
//! ## Example
//!
//! ```
//! use awsign_core::time::SigningTime;
//! use awsign_v4::Credential;
//! use awsign_v4::Signer;
//! use awsign_v4::EMPTY_STRING_SHA256;
//!
//! # fn main() -> awsign_core::Result<()> {
//! let signer = Signer::builder()
//!     .credential(Credential::new("AKIA0123456789", "MY_SECRET", None))
//!     .region_service("us-east-1", "dynamodb")
//!     .build()?;
//!
//! let (mut parts, _) = http::Request::post("https://dynamodb.us-east-1.amazonaws.com")
//!     .body(())?
//!     .into_parts();
//! let time = SigningTime::from_unix(0).expect("epoch is in range");
//! signer.sign(&mut parts, EMPTY_STRING_SHA256, &time)?;
//!
//! assert!(parts.headers["authorization"]
//!     .to_str()?
//!     .ends_with("Signature=97afaccd6bb80fd0b79089a895eba5097231dfd469ad60c277e68c66ff80cae9"));
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod canonical;
pub use canonical::SigningMethod;

mod config;
pub use config::Config;

mod constants;
pub use constants::EMPTY_STRING_SHA256;
pub use constants::UNSIGNED_PAYLOAD;

mod credential;
pub use credential::Credential;

mod key;
pub use key::derive_signing_key;
pub use key::DeriveKey;
pub use key::DerivedKeyCache;
pub use key::HmacKeyDeriver;

mod sign_request;
pub use sign_request::Builder;
pub use sign_request::Signer;
