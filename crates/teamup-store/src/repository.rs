//! Storage capability consumed by the connection graph and account service.

use teamup_core::{Result, UserId};

use crate::types::User;

/// Trait for user storage backends.
///
/// Implementations:
/// - `MemoryUserStore`: process-lifetime map
/// - `SqliteUserStore`: SQLite file, one row per user plus relationship rows
pub trait UserRepository: Send + Sync {
    /// Load one user. `Ok(None)` if the id is unknown.
    fn get(&self, id: UserId) -> Result<Option<User>>;

    /// Load every user, ordered by id.
    fn get_all(&self) -> Result<Vec<User>>;

    /// Insert or replace a user.
    fn save(&self, user: &User) -> Result<()>;

    /// Persist several users as one unit.
    ///
    /// The default saves one by one; backends that can do better override it.
    fn save_all(&self, users: &[User]) -> Result<()> {
        for user in users {
            self.save(user)?;
        }
        Ok(())
    }

    /// Find a user by email, ignoring ASCII case.
    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .get_all()?
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    /// Number of stored users.
    fn count(&self) -> Result<usize> {
        Ok(self.get_all()?.len())
    }

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}
