//! Connection requests between users.
//!
//! A request has no identity of its own: it exists only as the requester's id
//! in the target's `pending_requests` and the target's id in the requester's
//! `sent_requests`. Every transition loads both users, checks the rules on
//! the loaded copies, and writes both back with one `save_all`. Nothing is
//! written on an error path.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use teamup_core::{Error, LimitSide, Result, UserId, MAX_CONNECTIONS};
use teamup_store::{Relations, User, UserPublic, UserRepository};

use crate::audit::{audit_users, Violation};

/// Request/accept/reject/remove state machine over a user repository.
pub struct ConnectionGraph {
    repo: Arc<dyn UserRepository>,
    /// Mutations hold the write side for the whole load-check-save cycle.
    gate: RwLock<()>,
    limit: usize,
}

impl ConnectionGraph {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self::with_limit(repo, MAX_CONNECTIONS)
    }

    /// Create with a custom connection cap (for testing).
    pub fn with_limit(repo: Arc<dyn UserRepository>, limit: usize) -> Self {
        Self {
            repo,
            gate: RwLock::new(()),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn load(&self, id: UserId) -> Result<User> {
        self.repo
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn check_capacity(&self, own: &User, peer: &User, peer_side: LimitSide) -> Result<()> {
        if own.connections.len() >= self.limit {
            return Err(Error::LimitExceeded(LimitSide::Own));
        }
        if peer.connections.len() >= self.limit {
            return Err(Error::LimitExceeded(peer_side));
        }
        Ok(())
    }

    /// Send a connection request from `from_id` to `to_id`.
    pub fn request(&self, from_id: UserId, to_id: UserId) -> Result<()> {
        if from_id == to_id {
            return Err(Error::SelfRequest);
        }

        let _guard = self.gate.write();
        let mut from = self.load(from_id)?;
        let mut to = self.load(to_id)?;

        if let Err(e) = self.check_capacity(&from, &to, LimitSide::Target) {
            warn!("Request {} -> {} refused: {}", from_id, to_id, e);
            return Err(e);
        }

        let outstanding = from.sent_requests.contains(&to_id)
            || to.pending_requests.contains(&from_id)
            || from.pending_requests.contains(&to_id)
            || to.sent_requests.contains(&from_id);
        if outstanding {
            return Err(Error::DuplicateRequest);
        }

        if from.connections.contains(&to_id) || to.connections.contains(&from_id) {
            return Err(Error::AlreadyConnected);
        }

        to.pending_requests.insert(from_id);
        from.sent_requests.insert(to_id);
        self.repo.save_all(&[from, to])?;

        info!("Connection request sent: {} -> {}", from_id, to_id);
        Ok(())
    }

    /// Accept the pending request `requester_id` sent to `user_id`.
    ///
    /// An unknown user on either side is reported as `NoSuchRequest`, the same
    /// as a missing pending entry. On `LimitExceeded` the request stays
    /// pending.
    pub fn accept(&self, user_id: UserId, requester_id: UserId) -> Result<()> {
        let _guard = self.gate.write();

        let (Some(mut user), Some(mut requester)) =
            (self.repo.get(user_id)?, self.repo.get(requester_id)?)
        else {
            return Err(Error::NoSuchRequest);
        };
        if !user.pending_requests.contains(&requester_id) {
            return Err(Error::NoSuchRequest);
        }

        if let Err(e) = self.check_capacity(&user, &requester, LimitSide::Requester) {
            warn!("Accept {} <- {} refused: {}", user_id, requester_id, e);
            return Err(e);
        }

        user.pending_requests.remove(&requester_id);
        requester.sent_requests.remove(&user_id);
        // A crossed request in the other direction is settled by the same accept.
        user.sent_requests.remove(&requester_id);
        requester.pending_requests.remove(&user_id);

        user.connections.insert(requester_id);
        requester.connections.insert(user_id);
        self.repo.save_all(&[user, requester])?;

        info!("Connection accepted: {} <-> {}", user_id, requester_id);
        Ok(())
    }

    /// Drop the pending request `requester_id` sent to `user_id`.
    ///
    /// Both users must exist. A missing request is not an error.
    pub fn reject(&self, user_id: UserId, requester_id: UserId) -> Result<()> {
        let _guard = self.gate.write();
        let mut user = self.load(user_id)?;
        let mut requester = self.load(requester_id)?;

        let removed_pending = user.pending_requests.remove(&requester_id);
        let removed_sent = requester.sent_requests.remove(&user_id);
        if !(removed_pending || removed_sent) {
            debug!("Reject {} <- {}: nothing pending", user_id, requester_id);
            return Ok(());
        }

        self.repo.save_all(&[user, requester])?;
        info!("Connection rejected: {} <- {}", user_id, requester_id);
        Ok(())
    }

    /// Remove the connection between `user_id` and `other_id` on both sides.
    ///
    /// Both users must exist. Not being connected is not an error.
    pub fn remove(&self, user_id: UserId, other_id: UserId) -> Result<()> {
        let _guard = self.gate.write();
        let mut user = self.load(user_id)?;
        let mut other = self.load(other_id)?;

        let removed_own = user.connections.remove(&other_id);
        let removed_peer = other.connections.remove(&user_id);
        if !(removed_own || removed_peer) {
            debug!("Remove {} <-> {}: not connected", user_id, other_id);
            return Ok(());
        }

        self.repo.save_all(&[user, other])?;
        info!("Connection removed: {} <-> {}", user_id, other_id);
        Ok(())
    }

    /// Connections, incoming and outgoing requests of `user_id`, resolved to
    /// public records. Ids that no longer resolve are skipped.
    pub fn list_relations(&self, user_id: UserId) -> Result<Relations> {
        let _guard = self.gate.read();
        let user = self.load(user_id)?;

        let resolve = |ids: &std::collections::BTreeSet<UserId>| -> Result<Vec<UserPublic>> {
            let mut out = Vec::with_capacity(ids.len());
            for &id in ids {
                match self.repo.get(id)? {
                    Some(peer) => out.push(peer.to_public()),
                    None => debug!("User {} references missing user {}", user_id, id),
                }
            }
            Ok(out)
        };

        Ok(Relations {
            connections: resolve(&user.connections)?,
            pending_requests: resolve(&user.pending_requests)?,
            sent_requests: resolve(&user.sent_requests)?,
        })
    }

    /// Check every stored user against the relationship rules.
    pub fn audit(&self) -> Result<Vec<Violation>> {
        let _guard = self.gate.read();
        let users = self.repo.get_all()?;
        Ok(audit_users(&users, self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamup_store::{MemoryUserStore, SqliteUserStore};

    fn seeded(n: i64) -> (ConnectionGraph, Arc<dyn UserRepository>) {
        let repo: Arc<dyn UserRepository> = Arc::new(MemoryUserStore::new());
        for id in 1..=n {
            repo.save(&User::new(id, format!("user{}", id), format!("user{}@x.io", id), "", "h"))
                .unwrap();
        }
        (ConnectionGraph::new(repo.clone()), repo)
    }

    fn get(repo: &Arc<dyn UserRepository>, id: UserId) -> User {
        repo.get(id).unwrap().unwrap()
    }

    #[test]
    fn test_request_then_accept() {
        let (graph, repo) = seeded(2);

        graph.request(1, 2).unwrap();
        assert!(get(&repo, 1).sent_requests.contains(&2));
        assert!(get(&repo, 2).pending_requests.contains(&1));

        graph.accept(2, 1).unwrap();
        let a = get(&repo, 1);
        let b = get(&repo, 2);
        assert!(a.connections.contains(&2));
        assert!(b.connections.contains(&1));
        assert!(a.sent_requests.is_empty());
        assert!(b.pending_requests.is_empty());
        assert!(graph.audit().unwrap().is_empty());
    }

    #[test]
    fn test_request_twice_is_duplicate() {
        let (graph, repo) = seeded(2);
        graph.request(1, 2).unwrap();
        let before = (get(&repo, 1), get(&repo, 2));

        assert!(matches!(graph.request(1, 2), Err(Error::DuplicateRequest)));
        assert_eq!((get(&repo, 1), get(&repo, 2)), before);
    }

    #[test]
    fn test_reverse_request_is_duplicate() {
        let (graph, _repo) = seeded(2);
        graph.request(1, 2).unwrap();
        assert!(matches!(graph.request(2, 1), Err(Error::DuplicateRequest)));
    }

    #[test]
    fn test_request_when_connected() {
        let (graph, _repo) = seeded(2);
        graph.request(1, 2).unwrap();
        graph.accept(2, 1).unwrap();
        assert!(matches!(graph.request(1, 2), Err(Error::AlreadyConnected)));
        assert!(matches!(graph.request(2, 1), Err(Error::AlreadyConnected)));
    }

    #[test]
    fn test_request_self_and_unknown() {
        let (graph, _repo) = seeded(1);
        assert!(matches!(graph.request(1, 1), Err(Error::SelfRequest)));
        assert!(matches!(graph.request(1, 42), Err(Error::NotFound(_))));
        assert!(matches!(graph.request(42, 1), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_reject_clears_request() {
        let (graph, repo) = seeded(2);
        graph.request(1, 2).unwrap();
        graph.reject(2, 1).unwrap();

        let a = get(&repo, 1);
        let b = get(&repo, 2);
        assert!(a.sent_requests.is_empty());
        assert!(b.pending_requests.is_empty());
        assert!(a.connections.is_empty());
        assert!(b.connections.is_empty());

        // A rejected pair can start over.
        graph.request(1, 2).unwrap();
    }

    #[test]
    fn test_reject_without_request_is_noop() {
        let (graph, repo) = seeded(2);
        graph.reject(2, 1).unwrap();
        assert_eq!(get(&repo, 1).sent_requests.len(), 0);
        assert!(matches!(graph.reject(2, 42), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_reject_leaves_connections() {
        let (graph, repo) = seeded(2);
        graph.request(1, 2).unwrap();
        graph.accept(2, 1).unwrap();
        graph.reject(2, 1).unwrap();
        assert!(get(&repo, 1).connections.contains(&2));
    }

    #[test]
    fn test_accept_without_request() {
        let (graph, repo) = seeded(2);
        assert!(matches!(graph.accept(2, 1), Err(Error::NoSuchRequest)));
        assert!(matches!(graph.accept(2, 42), Err(Error::NoSuchRequest)));
        assert!(matches!(graph.accept(42, 1), Err(Error::NoSuchRequest)));
        assert!(get(&repo, 1).connections.is_empty());
    }

    #[test]
    fn test_accept_by_sender_is_rejected() {
        let (graph, _repo) = seeded(2);
        graph.request(1, 2).unwrap();
        assert!(matches!(graph.accept(1, 2), Err(Error::NoSuchRequest)));
    }

    #[test]
    fn test_requester_at_limit() {
        let (graph, _repo) = seeded(7);
        for peer in 2..=6 {
            graph.request(1, peer).unwrap();
            graph.accept(peer, 1).unwrap();
        }
        assert!(matches!(
            graph.request(1, 7),
            Err(Error::LimitExceeded(LimitSide::Own))
        ));
    }

    #[test]
    fn test_target_at_limit_leaves_state() {
        let (graph, repo) = seeded(7);
        for peer in 2..=6 {
            graph.request(peer, 1).unwrap();
            graph.accept(1, peer).unwrap();
        }
        let before = (get(&repo, 7), get(&repo, 1));
        assert!(matches!(
            graph.request(7, 1),
            Err(Error::LimitExceeded(LimitSide::Target))
        ));
        assert_eq!((get(&repo, 7), get(&repo, 1)), before);
    }

    #[test]
    fn test_accept_at_limit_keeps_request() {
        let (graph, repo) = seeded(7);
        // 7 asks 1 while 1 still has room.
        graph.request(7, 1).unwrap();
        for peer in 2..=6 {
            graph.request(1, peer).unwrap();
            graph.accept(peer, 1).unwrap();
        }

        assert!(matches!(
            graph.accept(1, 7),
            Err(Error::LimitExceeded(LimitSide::Own))
        ));
        assert!(get(&repo, 1).pending_requests.contains(&7));
        assert!(get(&repo, 7).sent_requests.contains(&1));

        graph.remove(1, 2).unwrap();
        graph.accept(1, 7).unwrap();
        assert_eq!(get(&repo, 1).connections.len(), 5);
        assert!(graph.audit().unwrap().is_empty());
    }

    #[test]
    fn test_accept_when_requester_full() {
        let (graph, _repo) = seeded(7);
        graph.request(1, 7).unwrap();
        for peer in 2..=6 {
            graph.request(1, peer).unwrap();
            graph.accept(peer, 1).unwrap();
        }
        assert!(matches!(
            graph.accept(7, 1),
            Err(Error::LimitExceeded(LimitSide::Requester))
        ));
    }

    #[test]
    fn test_remove_is_symmetric() {
        let (graph, repo) = seeded(2);
        graph.request(1, 2).unwrap();
        graph.accept(2, 1).unwrap();

        graph.remove(2, 1).unwrap();
        assert!(get(&repo, 1).connections.is_empty());
        assert!(get(&repo, 2).connections.is_empty());

        graph.remove(2, 1).unwrap();
        assert!(matches!(graph.remove(2, 42), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_list_relations() {
        let (graph, _repo) = seeded(4);
        graph.request(1, 2).unwrap();
        graph.accept(2, 1).unwrap();
        graph.request(1, 3).unwrap();
        graph.request(4, 1).unwrap();

        let relations = graph.list_relations(1).unwrap();
        let ids = |list: &[UserPublic]| list.iter().map(|u| u.id).collect::<Vec<_>>();
        assert_eq!(ids(&relations.connections), vec![2]);
        assert_eq!(ids(&relations.sent_requests), vec![3]);
        assert_eq!(ids(&relations.pending_requests), vec![4]);
        assert_eq!(relations.connections[0].name, "user2");

        assert!(matches!(graph.list_relations(42), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_graph_over_sqlite() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo: Arc<dyn UserRepository> = Arc::new(SqliteUserStore::open(dir.path()).unwrap());
        for id in 1..=3 {
            repo.save(&User::new(id, "n", format!("{}@x.io", id), "", "h")).unwrap();
        }
        let graph = ConnectionGraph::with_limit(repo.clone(), 1);

        graph.request(1, 2).unwrap();
        graph.accept(2, 1).unwrap();
        assert!(matches!(
            graph.request(3, 1),
            Err(Error::LimitExceeded(LimitSide::Target))
        ));
        assert!(get(&repo, 2).connections.contains(&1));
        assert!(graph.audit().unwrap().is_empty());
    }
}
