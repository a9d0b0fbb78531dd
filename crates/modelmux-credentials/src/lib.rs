//! # modelmux-credentials
//!
//! Credential validation for registered providers.
//!
//! - Providers that **require** a credential fail immediately with
//!   [`Error::CredentialMissing`] when none is supplied — no network call.
//! - Providers with an **optional** credential validate as usable without
//!   one, with a rate-limit caveat in the result detail.
//! - Remote checks go through the [`CredentialEndpoint`] seam with bounded
//!   exponential backoff for transient failures; authorization rejections
//!   (401/403-class) short-circuit as invalid on the first attempt.
//! - Results are cached per provider, keyed by a SHA-256 digest of the
//!   credential; the raw credential is never stored. Supplying a different
//!   credential replaces the prior cache entry immediately.

pub mod endpoint;
pub mod error;
pub mod http;
pub mod validator;

pub use endpoint::{CheckError, CredentialEndpoint};
pub use error::{Error, Result};
pub use http::HttpCredentialEndpoint;
pub use validator::{CredentialValidationResult, CredentialValidator, Validity};
