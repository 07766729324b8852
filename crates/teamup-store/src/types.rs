//! Data types for users and their relationship sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use teamup_core::UserId;

/// A stored user, credentials included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub skills: String,
    pub password_hash: String,
    /// Accepted connections. Symmetric across the pair.
    pub connections: BTreeSet<UserId>,
    /// Users who sent this user an unresolved request.
    pub pending_requests: BTreeSet<UserId>,
    /// Users this user has requested, not yet resolved.
    pub sent_requests: BTreeSet<UserId>,
}

impl User {
    /// A fresh user with no relationships.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        skills: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            skills: skills.into(),
            password_hash: password_hash.into(),
            connections: BTreeSet::new(),
            pending_requests: BTreeSet::new(),
            sent_requests: BTreeSet::new(),
        }
    }

    /// Mutable access to one of the three relationship sets.
    pub fn links_mut(&mut self, kind: LinkKind) -> &mut BTreeSet<UserId> {
        match kind {
            LinkKind::Connection => &mut self.connections,
            LinkKind::Pending => &mut self.pending_requests,
            LinkKind::Sent => &mut self.sent_requests,
        }
    }

    pub fn links(&self, kind: LinkKind) -> &BTreeSet<UserId> {
        match kind {
            LinkKind::Connection => &self.connections,
            LinkKind::Pending => &self.pending_requests,
            LinkKind::Sent => &self.sent_requests,
        }
    }

    /// Copy without credential fields.
    pub fn to_public(&self) -> UserPublic {
        UserPublic::from(self)
    }
}

/// Kind of relationship entry held by a user about a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Connection,
    Pending,
    Sent,
}

impl LinkKind {
    pub const ALL: [LinkKind; 3] = [LinkKind::Connection, LinkKind::Pending, LinkKind::Sent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Pending => "pending",
            Self::Sent => "sent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "connection" => Some(Self::Connection),
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            _ => None,
        }
    }
}

/// User record as exposed over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub skills: String,
    pub connections: Vec<UserId>,
    pub pending_requests: Vec<UserId>,
    pub sent_requests: Vec<UserId>,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            skills: user.skills.clone(),
            connections: user.connections.iter().copied().collect(),
            pending_requests: user.pending_requests.iter().copied().collect(),
            sent_requests: user.sent_requests.iter().copied().collect(),
        }
    }
}

/// The three relationship lists of one user, resolved to public records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relations {
    pub connections: Vec<UserPublic>,
    pub pending_requests: Vec<UserPublic>,
    pub sent_requests: Vec<UserPublic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_view_drops_password() {
        let mut user = User::new(7, "Ada", "ada@example.com", "rust", "$argon2id$secret");
        user.connections.insert(9);

        let json = serde_json::to_value(user.to_public()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["connections"][0], 9);
        assert!(json["pendingRequests"].is_array());
        assert!(json["sentRequests"].is_array());
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn test_link_kind_roundtrip_names() {
        for kind in LinkKind::ALL {
            assert_eq!(LinkKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(LinkKind::parse("friend"), None);
    }
}
