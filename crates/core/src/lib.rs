//! `menugate-core`: shared domain vocabulary.
//!
//! Identifiers, the entity trait and the domain error
//! type. No IO, no storage, no transport.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{GroupId, MenuId, UserId};
