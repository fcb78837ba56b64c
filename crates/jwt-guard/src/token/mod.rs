//! Token handling.
//!
//! # Components
//!
//! - `claims` - Decoded claim set produced by successful validation
//! - `extract` - Pulling the raw token out of a request
//! - `validate` - Signature and time-claim validation

pub mod claims;
pub mod extract;
pub mod validate;

pub use claims::DecodedToken;
pub use extract::{
    token_from_form, token_from_header, token_from_query, DefaultTokenExtractor, RawToken,
    TokenExtractor,
};
pub use validate::{
    decode_unverified, decode_verified, DefaultTokenValidator, TokenValidator,
    ValidationSettings,
};
