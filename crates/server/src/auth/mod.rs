//! Stateless session tokens.

mod token;

pub use token::{IssuedToken, SessionClaims, TOKEN_TTL_SECS, TokenError, TokenService};
