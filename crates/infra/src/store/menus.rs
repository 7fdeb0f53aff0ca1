use std::collections::BTreeMap;
use std::sync::RwLock;

use menugate_auth::{MenuSource, StoreError};
use menugate_core::{Entity, MenuId};
use menugate_menu::MenuNode;

use super::{read, write};

/// In-memory menu table keyed by `menu_id`.
#[derive(Debug, Default)]
pub struct InMemoryMenuStore {
    inner: RwLock<BTreeMap<MenuId, MenuNode>>,
}

impl InMemoryMenuStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_menus(menus: impl IntoIterator<Item = MenuNode>) -> Self {
        let rows = menus.into_iter().map(|m| (m.id().clone(), m)).collect();
        Self { inner: RwLock::new(rows) }
    }

    /// Insert or overwrite a menu row.
    pub fn upsert(&self, menu: MenuNode) -> Result<(), StoreError> {
        write(&self.inner)?.insert(menu.id().clone(), menu);
        Ok(())
    }

    pub fn remove(&self, menu_id: &MenuId) -> Result<Option<MenuNode>, StoreError> {
        Ok(write(&self.inner)?.remove(menu_id))
    }

    pub fn get(&self, menu_id: &MenuId) -> Result<Option<MenuNode>, StoreError> {
        Ok(read(&self.inner)?.get(menu_id).cloned())
    }
}

impl MenuSource for InMemoryMenuStore {
    fn menus(&self) -> Result<Vec<MenuNode>, StoreError> {
        Ok(read(&self.inner)?.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_existing_row() {
        let store = InMemoryMenuStore::with_menus([MenuNode::new("sys", "System")]);
        store.upsert(MenuNode::new("sys", "Settings")).unwrap();

        let menus = store.menus().unwrap();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].title, "Settings");
    }

    #[test]
    fn remove_returns_deleted_row() {
        let store = InMemoryMenuStore::with_menus([MenuNode::new("sys", "System")]);

        assert!(store.remove(&MenuId::new("sys")).unwrap().is_some());
        assert!(store.get(&MenuId::new("sys")).unwrap().is_none());
        assert!(store.menus().unwrap().is_empty());
    }
}
