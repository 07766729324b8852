//! Consistency checks over a set of users.

use std::collections::HashMap;

use serde::Serialize;
use teamup_core::UserId;
use teamup_store::{LinkKind, User};

/// One broken relationship rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Violation {
    /// More accepted connections than the cap allows.
    OverCap { user: UserId, count: usize },
    /// A user lists itself in one of its sets.
    SelfLink { user: UserId, kind: &'static str },
    /// A set points at a user that does not exist.
    DanglingLink {
        user: UserId,
        peer: UserId,
        kind: &'static str,
    },
    /// `peer` is in `user.connections` but not the other way round.
    AsymmetricConnection { user: UserId, peer: UserId },
    /// `peer` is in `user.pending_requests` without `user` in `peer.sent_requests`.
    UnmatchedPending { user: UserId, peer: UserId },
    /// `peer` is in `user.sent_requests` without `user` in `peer.pending_requests`.
    UnmatchedSent { user: UserId, peer: UserId },
    /// The pair is connected and still has a request outstanding.
    ConnectedWithRequest { user: UserId, peer: UserId },
    /// Requests outstanding in both directions for the same pair.
    CrossedRequests { user: UserId, peer: UserId },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OverCap { user, count } => {
                write!(f, "user {} has {} connections", user, count)
            }
            Self::SelfLink { user, kind } => write!(f, "user {} has a {} link to itself", user, kind),
            Self::DanglingLink { user, peer, kind } => {
                write!(f, "user {} has a {} link to missing user {}", user, kind, peer)
            }
            Self::AsymmetricConnection { user, peer } => {
                write!(f, "user {} lists {} as connection but not vice versa", user, peer)
            }
            Self::UnmatchedPending { user, peer } => {
                write!(f, "user {} has pending request from {} with no sent entry", user, peer)
            }
            Self::UnmatchedSent { user, peer } => {
                write!(f, "user {} has sent request to {} with no pending entry", user, peer)
            }
            Self::ConnectedWithRequest { user, peer } => {
                write!(f, "users {} and {} are connected with a request outstanding", user, peer)
            }
            Self::CrossedRequests { user, peer } => {
                write!(f, "users {} and {} have requests in both directions", user, peer)
            }
        }
    }
}

/// Check every relationship rule over `users`.
///
/// Pair violations are reported once per offending entry, from the point of
/// view of the user holding it.
pub fn audit_users(users: &[User], limit: usize) -> Vec<Violation> {
    let by_id: HashMap<UserId, &User> = users.iter().map(|u| (u.id, u)).collect();
    let mut violations = Vec::new();

    for user in users {
        if user.connections.len() > limit {
            violations.push(Violation::OverCap {
                user: user.id,
                count: user.connections.len(),
            });
        }

        for kind in LinkKind::ALL {
            for &peer_id in user.links(kind) {
                if peer_id == user.id {
                    violations.push(Violation::SelfLink {
                        user: user.id,
                        kind: kind.as_str(),
                    });
                    continue;
                }
                let Some(peer) = by_id.get(&peer_id) else {
                    violations.push(Violation::DanglingLink {
                        user: user.id,
                        peer: peer_id,
                        kind: kind.as_str(),
                    });
                    continue;
                };

                match kind {
                    LinkKind::Connection => {
                        if !peer.connections.contains(&user.id) {
                            violations.push(Violation::AsymmetricConnection {
                                user: user.id,
                                peer: peer_id,
                            });
                        }
                        if user.pending_requests.contains(&peer_id)
                            || user.sent_requests.contains(&peer_id)
                        {
                            violations.push(Violation::ConnectedWithRequest {
                                user: user.id,
                                peer: peer_id,
                            });
                        }
                    }
                    LinkKind::Pending => {
                        if !peer.sent_requests.contains(&user.id) {
                            violations.push(Violation::UnmatchedPending {
                                user: user.id,
                                peer: peer_id,
                            });
                        }
                        if user.sent_requests.contains(&peer_id) {
                            violations.push(Violation::CrossedRequests {
                                user: user.id,
                                peer: peer_id,
                            });
                        }
                    }
                    LinkKind::Sent => {
                        if !peer.pending_requests.contains(&user.id) {
                            violations.push(Violation::UnmatchedSent {
                                user: user.id,
                                peer: peer_id,
                            });
                        }
                    }
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: UserId) -> User {
        User::new(id, format!("u{}", id), format!("u{}@x.io", id), "", "h")
    }

    #[test]
    fn test_consistent_users_pass() {
        let mut a = user(1);
        let mut b = user(2);
        let mut c = user(3);
        a.connections.insert(2);
        b.connections.insert(1);
        a.sent_requests.insert(3);
        c.pending_requests.insert(1);

        assert!(audit_users(&[a, b, c], 5).is_empty());
    }

    #[test]
    fn test_detects_asymmetry_and_unmatched() {
        let mut a = user(1);
        let mut b = user(2);
        a.connections.insert(2);
        b.pending_requests.insert(1);

        let violations = audit_users(&[a, b], 5);
        assert!(violations.contains(&Violation::AsymmetricConnection { user: 1, peer: 2 }));
        assert!(violations.contains(&Violation::UnmatchedPending { user: 2, peer: 1 }));
    }

    #[test]
    fn test_detects_over_cap_and_self_link() {
        let mut a = user(1);
        a.connections.insert(1);
        let violations = audit_users(&[a], 0);
        assert!(violations.contains(&Violation::OverCap { user: 1, count: 1 }));
        assert!(violations.contains(&Violation::SelfLink {
            user: 1,
            kind: "connection"
        }));
    }

    #[test]
    fn test_detects_dangling_link() {
        let mut a = user(1);
        a.sent_requests.insert(99);
        assert_eq!(
            audit_users(&[a], 5),
            vec![Violation::DanglingLink {
                user: 1,
                peer: 99,
                kind: "sent"
            }]
        );
    }
}
