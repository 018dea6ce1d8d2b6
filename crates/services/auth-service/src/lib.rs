//! Auth Service Library
//!
//! Sign-in and sign-out: credential verification through the user
//! repository, audit of every authentication event, and JWT issuance.

pub mod config;
pub mod service;
pub mod token;

pub use service::{AuthService, Authenticator};
pub use token::{JwtIssuer, TokenClaims, TokenIssuer};
