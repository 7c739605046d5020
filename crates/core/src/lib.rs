//! `pricebook-core`: domain foundation shared by every pricebook crate.
//!
//! Pure types only: identifiers, the domain error model, field-keyed
//! validation errors and the aggregate versioning contract.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult, FieldError, FieldErrors};
pub use id::{EntityId, TenantId, UserId};
