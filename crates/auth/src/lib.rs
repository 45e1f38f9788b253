//! `buildmart-auth`: actor identity and claims validation.
//!
//! Token issuance and signature verification are deliberately outside this
//! crate; it models the claims an already-verified token carries and the
//! validator seam the API layer plugs into.

pub mod claims;
pub mod role;
pub mod validator;

pub use claims::{AuthClaims, TokenValidationError, validate_claims};
pub use role::{Actor, ActorRole};
pub use validator::{StaticTokenValidator, TokenError, TokenValidator};
