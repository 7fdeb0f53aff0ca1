use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use menugate_auth::{Group, GrantSource, GroupMembershipResolver, Membership, MenuSource, PermissionGrant, StoreError};
use menugate_core::{GroupId, UserId};
use menugate_menu::MenuNode;

use crate::config::SnapshotConfig;

pub const MENUS_FILE: &str = "menus.json";
pub const GRANTS_FILE: &str = "grants.json";
pub const GROUPS_FILE: &str = "groups.json";
pub const MEMBERSHIPS_FILE: &str = "memberships.json";

/// One row of `memberships.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRow {
    pub user_id: UserId,
    #[serde(default)]
    pub group_ids: Vec<GroupId>,
}

/// Snapshot store reading JSON arrays from a directory.
///
/// Files are re-read on every call. `menus.json`, `grants.json` and
/// `memberships.json` are required; `groups.json` is optional and, when
/// present, memberships in inactive or undefined groups are dropped.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    dir: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &SnapshotConfig) -> Self {
        Self::new(config.dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StoreError> {
        self.load_optional(file)?
            .ok_or_else(|| StoreError::Unavailable(format!("{} not found", self.dir.join(file).display())))
    }

    fn load_optional<T: DeserializeOwned>(&self, file: &str) -> Result<Option<Vec<T>>, StoreError> {
        let path = self.dir.join(file);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Unavailable(format!("{}: {e}", path.display()))),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Malformed(format!("{}: {e}", path.display())))
    }
}

impl MenuSource for JsonSnapshotStore {
    fn menus(&self) -> Result<Vec<MenuNode>, StoreError> {
        self.load(MENUS_FILE)
    }
}

impl GrantSource for JsonSnapshotStore {
    fn grants(&self) -> Result<Vec<PermissionGrant>, StoreError> {
        self.load(GRANTS_FILE)
    }
}

impl GroupMembershipResolver for JsonSnapshotStore {
    fn resolve(&self, user_id: &UserId) -> Result<Membership, StoreError> {
        let rows: Vec<MembershipRow> = self.load(MEMBERSHIPS_FILE)?;
        let Some(row) = rows.into_iter().find(|r| r.user_id == *user_id) else {
            return Ok(Membership::Unauthenticated);
        };

        let groups: Option<BTreeMap<GroupId, Group>> = self
            .load_optional::<Group>(GROUPS_FILE)?
            .map(|groups| groups.into_iter().map(|g| (g.group_id.clone(), g)).collect());

        let group_ids: Vec<GroupId> = match groups {
            None => row.group_ids,
            Some(groups) => row
                .group_ids
                .into_iter()
                .filter(|g| {
                    let usable = groups.get(g).is_some_and(|group| group.active);
                    if !usable {
                        tracing::debug!(user_id = %user_id, group_id = %g, "dropping inactive or undefined group");
                    }
                    usable
                })
                .collect(),
        };

        Ok(Membership::authenticated(user_id.clone(), group_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, file: &str, body: &str) {
        fs::write(dir.join(file), body).unwrap();
    }

    #[test]
    fn missing_menu_file_is_unavailable_not_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(tmp.path());

        assert!(matches!(store.menus(), Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), GRANTS_FILE, "{not json");
        let store = JsonSnapshotStore::new(tmp.path());

        assert!(matches!(store.grants(), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn groups_file_filters_inactive_groups() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            MEMBERSHIPS_FILE,
            r#"[{"userId":"alice","groupIds":["ADMIN","OLD"]}]"#,
        );
        write(
            tmp.path(),
            GROUPS_FILE,
            r#"[{"groupId":"ADMIN","groupName":"Admins"},{"groupId":"OLD","groupName":"Old","active":false}]"#,
        );
        let store = JsonSnapshotStore::new(tmp.path());

        let m = store.resolve(&UserId::new("alice")).unwrap();
        let groups: Vec<_> = m.principal().unwrap().group_ids.iter().map(GroupId::as_str).collect();
        assert_eq!(groups, vec!["ADMIN"]);
        assert_eq!(store.resolve(&UserId::new("bob")).unwrap(), Membership::Unauthenticated);
    }

    #[test]
    fn without_groups_file_memberships_are_taken_as_is() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), MEMBERSHIPS_FILE, r#"[{"userId":"alice","groupIds":["X"]}]"#);
        let store = JsonSnapshotStore::new(tmp.path());

        let m = store.resolve(&UserId::new("alice")).unwrap();
        assert_eq!(m.principal().unwrap().group_ids.len(), 1);
    }
}
