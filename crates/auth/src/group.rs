use serde::{Deserialize, Serialize};

use menugate_core::{DomainError, DomainResult, Entity, GroupId};

fn default_level() -> u8 {
    1
}

fn default_active() -> bool {
    true
}

/// Group (role-like permission holder).
///
/// An inactive group keeps its grants on record but contributes nothing to
/// its members' effective permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub group_id: GroupId,
    pub group_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_level")]
    pub level: u8,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Group {
    pub const MAX_LEVEL: u8 = 10;

    pub fn new(group_id: impl Into<GroupId>, group_name: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            group_name: group_name.into(),
            description: None,
            level: default_level(),
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.group_id.as_str().trim().is_empty() {
            return Err(DomainError::invalid_id("GroupId: must not be blank"));
        }
        if self.group_name.trim().is_empty() {
            return Err(DomainError::validation("group name must not be blank"));
        }
        if self.level > Self::MAX_LEVEL {
            return Err(DomainError::validation(format!(
                "group level {} exceeds maximum {}",
                self.level,
                Self::MAX_LEVEL
            )));
        }
        Ok(())
    }
}

impl Entity for Group {
    type Id = GroupId;

    fn id(&self) -> &Self::Id {
        &self.group_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_above_ten_is_rejected() {
        let group = Group {
            level: 11,
            ..Group::new("OPS", "Operations")
        };
        assert!(matches!(group.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn defaults_apply_when_deserializing() {
        let group: Group = serde_json::from_str(r#"{"groupId":"USER","groupName":"Users"}"#).unwrap();
        assert!(group.active);
        assert_eq!(group.level, 1);
        assert!(group.validate().is_ok());
    }
}
