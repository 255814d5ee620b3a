//! Credential injection for outbound requests.
//!
//! [`TokenProvider`] is where a token comes from; [`BearerAuth`] is the request
//! interceptor that writes it into each request. The provider is handed to the
//! interceptor explicitly so tests can drive it.

mod bearer;
mod token;

pub use bearer::BearerAuth;
pub use token::{StaticToken, TokenProvider, TokenStore};
