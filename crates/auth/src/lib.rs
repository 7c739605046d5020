//! `pricebook-auth`: authentication and authorization boundary.
//!
//! Decoupled from HTTP and storage: the API layer hands in a bearer token and
//! gets back validated claims, then asks whether the principal holds a
//! permission inside its tenant.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod roles;

pub use authorize::{authorize, AuthzError, Principal, TenantMembership};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use permissions::Permission;
pub use roles::{permissions_for_roles, Role};
