//! Strongly-typed identifiers used across the domain.
//!
//! All identifiers are opaque strings assigned by the administrative side
//! (e.g. `"sys-menu"`, `"ADMIN"`). Ordering is lexical, which is what sibling
//! tie-breaking and deterministic map output rely on.

use core::str::FromStr;
use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a menu node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuId(String);

/// Identifier of a group (role-like permission holder).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

/// Identifier of a user (authenticated principal).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a raw identifier without validation.
            ///
            /// Snapshot rows are taken as-is; use `FromStr` for external input.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl Borrow<str> for $t {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: must not be blank", $name)));
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

impl_string_newtype!(MenuId, "MenuId");
impl_string_newtype!(GroupId, "GroupId");
impl_string_newtype!(UserId, "UserId");
