//! Signing service for direct media uploads
//!
//! Clients post the upload parameters they intend to send; the service answers
//! with a SHA-1 signature over the allowed subset plus the account secret, so
//! the secret never leaves the server.

pub mod server;
pub mod sign;

pub use server::{router, SignError, SignResponse, SignerConfig};
pub use sign::{sign_params, string_to_sign, ALLOWED_KEYS};
