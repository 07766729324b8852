//! In-memory user store. Contents live as long as the process.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use teamup_core::{Result, UserId};
use tracing::debug;

use crate::repository::UserRepository;
use crate::types::User;

/// Map-backed repository.
pub struct MemoryUserStore {
    users: RwLock<BTreeMap<UserId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRepository for MemoryUserStore {
    fn get(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    fn get_all(&self) -> Result<Vec<User>> {
        Ok(self.users.read().values().cloned().collect())
    }

    fn save(&self, user: &User) -> Result<()> {
        self.users.write().insert(user.id, user.clone());
        Ok(())
    }

    fn save_all(&self, users: &[User]) -> Result<()> {
        let mut map = self.users.write();
        for user in users {
            map.insert(user.id, user.clone());
        }
        debug!("MemoryUserStore saved {} users", users.len());
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.users.read().len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
