//! `bazaar-auth`: authentication boundary (identity, roles, bearer tokens).
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod jwt;
pub mod principal;
pub mod roles;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use principal::{Principal, PrincipalId};
pub use roles::Role;
