//! Refresh-token codec.
//!
//! Refresh tokens are HS256 JWTs over an arbitrary claims object. They carry no
//! expiry, issuer or audience: a token is valid as long as its signature
//! verifies under the secret the caller passes in.

pub mod codec;

pub use codec::{decode_claims, encode_claims, Claims, TokenError};
