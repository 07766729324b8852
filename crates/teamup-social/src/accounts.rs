//! Signup, login and the user directory.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use tracing::{info, warn};

use teamup_core::{next_user_id, Error, Result, UserId};
use teamup_store::{User, UserPublic, UserRepository};

use crate::password::{hash_password, verify_password};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Fields submitted at signup.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub skills: String,
    pub password: String,
}

/// Trim and lowercase an email, rejecting anything without a plausible shape.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(Error::Validation(format!("invalid email address: {}", email)));
    }
    Ok(email)
}

/// User account operations over a repository.
pub struct AccountService {
    repo: Arc<dyn UserRepository>,
    /// Serializes the email-uniqueness check with the insert.
    signup_lock: Mutex<()>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self {
            repo,
            signup_lock: Mutex::new(()),
        }
    }

    /// Register a new user. Emails are unique, compared case-insensitively.
    pub fn signup(&self, account: NewAccount) -> Result<UserPublic> {
        let name = account.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("name is required".into()));
        }
        if account.password.is_empty() {
            return Err(Error::Validation("password is required".into()));
        }
        let email = normalize_email(&account.email)?;
        let password_hash = hash_password(&account.password)?;

        let _guard = self.signup_lock.lock();
        if self.repo.find_by_email(&email)?.is_some() {
            warn!("Signup refused: {} already registered", email);
            return Err(Error::EmailTaken);
        }

        let user = User::new(
            next_user_id(),
            name,
            email,
            account.skills.trim(),
            password_hash,
        );
        self.repo.save(&user)?;

        info!("User signed up: id={}, email={}", user.id, user.email);
        Ok(user.to_public())
    }

    /// Check credentials. Unknown email and wrong password are the same error.
    pub fn login(&self, email: &str, password: &str) -> Result<UserPublic> {
        let email = email.trim().to_lowercase();
        let user = self
            .repo
            .find_by_email(&email)?
            .ok_or(Error::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            warn!("Login failed for user {}", user.id);
            return Err(Error::InvalidCredentials);
        }

        info!("User logged in: id={}", user.id);
        Ok(user.to_public())
    }

    /// Every user, credentials stripped.
    pub fn directory(&self) -> Result<Vec<UserPublic>> {
        Ok(self.repo.get_all()?.iter().map(User::to_public).collect())
    }

    /// One user, credentials stripped.
    pub fn get(&self, id: UserId) -> Result<UserPublic> {
        self.repo
            .get(id)?
            .map(|u| u.to_public())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn count(&self) -> Result<usize> {
        self.repo.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamup_store::MemoryUserStore;

    fn service() -> AccountService {
        AccountService::new(Arc::new(MemoryUserStore::new()))
    }

    fn account(email: &str) -> NewAccount {
        NewAccount {
            name: "Ada".into(),
            email: email.into(),
            skills: "rust".into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn test_signup_and_login() {
        let svc = service();
        let created = svc.signup(account("Ada@Example.com ")).unwrap();
        assert_eq!(created.email, "ada@example.com");
        assert!(created.connections.is_empty());

        let logged_in = svc.login("ada@example.com", "secret").unwrap();
        assert_eq!(logged_in.id, created.id);
        assert_eq!(svc.get(created.id).unwrap().name, "Ada");
    }

    #[test]
    fn test_duplicate_email() {
        let svc = service();
        svc.signup(account("ada@example.com")).unwrap();
        assert!(matches!(
            svc.signup(account("ADA@example.com")),
            Err(Error::EmailTaken)
        ));
        assert_eq!(svc.count().unwrap(), 1);
    }

    #[test]
    fn test_bad_credentials_are_indistinguishable() {
        let svc = service();
        svc.signup(account("ada@example.com")).unwrap();

        let wrong_password = svc.login("ada@example.com", "nope").unwrap_err();
        let unknown_email = svc.login("bob@example.com", "secret").unwrap_err();
        assert!(matches!(wrong_password, Error::InvalidCredentials));
        assert!(matches!(unknown_email, Error::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[test]
    fn test_signup_validation() {
        let svc = service();
        assert!(matches!(svc.signup(account("not-an-email")), Err(Error::Validation(_))));

        let mut nameless = account("x@y.io");
        nameless.name = "  ".into();
        assert!(matches!(svc.signup(nameless), Err(Error::Validation(_))));

        let mut no_password = account("x@y.io");
        no_password.password.clear();
        assert!(matches!(svc.signup(no_password), Err(Error::Validation(_))));
    }

    #[test]
    fn test_directory_lists_everyone() {
        let svc = service();
        let a = svc.signup(account("a@x.io")).unwrap();
        let b = svc.signup(account("b@x.io")).unwrap();
        let ids: Vec<_> = svc.directory().unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
        assert!(matches!(svc.get(1), Err(Error::NotFound(_))));
    }
}
