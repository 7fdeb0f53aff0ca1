use core::str::FromStr;

use serde::{Deserialize, Serialize};

use menugate_core::DomainError;

/// One of the four independent capabilities a grant can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Read,
    Write,
    Delete,
    Admin,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Read,
        Capability::Write,
        Capability::Delete,
        Capability::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Delete => "delete",
            Capability::Admin => "admin",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Capability::Read),
            "write" => Ok(Capability::Write),
            "delete" => Ok(Capability::Delete),
            "admin" => Ok(Capability::Admin),
            other => Err(DomainError::validation(format!("unknown capability '{other}'"))),
        }
    }
}

/// Four capability bits for one menu.
///
/// Used both for a single group's grant and for the merged result across a
/// user's groups. The merge is a bitwise OR, so the all-false record is the
/// identity and the result never depends on fold order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermission {
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_write: bool,
    #[serde(default)]
    pub can_delete: bool,
    #[serde(default)]
    pub can_admin: bool,
}

impl EffectivePermission {
    pub const NONE: EffectivePermission = EffectivePermission {
        can_read: false,
        can_write: false,
        can_delete: false,
        can_admin: false,
    };

    pub const ALL: EffectivePermission = EffectivePermission {
        can_read: true,
        can_write: true,
        can_delete: true,
        can_admin: true,
    };

    pub fn from_capabilities(caps: impl IntoIterator<Item = Capability>) -> Self {
        caps.into_iter().fold(Self::NONE, |acc, cap| acc.with(cap))
    }

    pub fn with(mut self, capability: Capability) -> Self {
        match capability {
            Capability::Read => self.can_read = true,
            Capability::Write => self.can_write = true,
            Capability::Delete => self.can_delete = true,
            Capability::Admin => self.can_admin = true,
        }
        self
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read => self.can_read,
            Capability::Write => self.can_write,
            Capability::Delete => self.can_delete,
            Capability::Admin => self.can_admin,
        }
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            can_read: self.can_read || other.can_read,
            can_write: self.can_write || other.can_write,
            can_delete: self.can_delete || other.can_delete,
            can_admin: self.can_admin || other.can_admin,
        }
    }

    /// Bitwise `self ⊆ other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        Capability::ALL
            .iter()
            .all(|&cap| !self.allows(cap) || other.allows(cap))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    pub fn granted(&self) -> Vec<Capability> {
        Capability::ALL.into_iter().filter(|&cap| self.allows(cap)).collect()
    }
}

impl core::ops::BitOr for EffectivePermission {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl core::ops::BitOrAssign for EffectivePermission {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}
