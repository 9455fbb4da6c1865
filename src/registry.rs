//! Connection registry
//!
//! The single source of truth for who is online: a join-ordered table
//! of `User` entries behind one mutex. Every operation takes the lock
//! for just the table work; no network write ever happens under it.

use tokio::sync::Mutex;

use crate::types::ConnId;
use crate::user::{PeerWriter, User};

/// Mutex-guarded table of registered users, in join order
#[derive(Default)]
pub struct Registry {
    users: Mutex<Vec<User>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under a username
    ///
    /// Always succeeds; duplicate usernames are allowed and later
    /// addressed by join order.
    pub async fn add(&self, conn_id: ConnId, username: String, writer: PeerWriter) -> User {
        let user = User::new(conn_id, username, writer);
        let mut users = self.users.lock().await;
        users.push(user.clone());
        user
    }

    /// Remove a connection's entry
    ///
    /// Idempotent: removing an absent connection returns `None`.
    pub async fn remove(&self, conn_id: ConnId) -> Option<User> {
        let mut users = self.users.lock().await;
        let idx = users.iter().position(|u| u.conn_id == conn_id)?;
        Some(users.remove(idx))
    }

    /// Earliest-joined user with the given name
    pub async fn find_by_username(&self, username: &str) -> Option<User> {
        let users = self.users.lock().await;
        users.iter().find(|u| u.username == username).cloned()
    }

    /// All users with the given name, in join order
    pub async fn find_all_by_username(&self, username: &str) -> Vec<User> {
        let users = self.users.lock().await;
        users
            .iter()
            .filter(|u| u.username == username)
            .cloned()
            .collect()
    }

    /// Snapshot of online usernames, in join order
    pub async fn usernames(&self) -> Vec<String> {
        let users = self.users.lock().await;
        users.iter().map(|u| u.username.clone()).collect()
    }

    /// Number of registered connections
    pub async fn count(&self) -> usize {
        self.users.lock().await.len()
    }

    /// Snapshot of registered users, optionally excluding one connection
    pub async fn peers(&self, excluding: Option<ConnId>) -> Vec<User> {
        let users = self.users.lock().await;
        users
            .iter()
            .filter(|u| excluding != Some(u.conn_id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::peer_writer;

    fn writer() -> PeerWriter {
        let (_ours, theirs) = tokio::io::duplex(64);
        peer_writer(theirs)
    }

    #[tokio::test]
    async fn test_count_matches_logins() {
        let registry = Registry::new();
        for name in ["Alice", "Bob", "Carol"] {
            registry.add(ConnId::new(), name.to_string(), writer()).await;
        }
        assert_eq!(registry.count().await, 3);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = Registry::new();
        let conn_id = ConnId::new();
        registry.add(conn_id, "Alice".to_string(), writer()).await;

        let removed = registry.remove(conn_id).await;
        assert_eq!(removed.map(|u| u.username).as_deref(), Some("Alice"));
        assert!(registry.remove(conn_id).await.is_none());
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_usernames_keep_join_order() {
        let registry = Registry::new();
        for name in ["Carol", "Alice", "Bob"] {
            registry.add(ConnId::new(), name.to_string(), writer()).await;
        }
        assert_eq!(registry.usernames().await, vec!["Carol", "Alice", "Bob"]);
    }

    #[tokio::test]
    async fn test_duplicate_names_resolve_to_earliest_join() {
        let registry = Registry::new();
        let first = ConnId::new();
        let second = ConnId::new();
        registry.add(first, "Alice".to_string(), writer()).await;
        registry.add(second, "Alice".to_string(), writer()).await;

        let found = registry.find_by_username("Alice").await.unwrap();
        assert_eq!(found.conn_id, first);

        let all = registry.find_all_by_username("Alice").await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].conn_id, first);
        assert_eq!(all[1].conn_id, second);
    }

    #[tokio::test]
    async fn test_absent_name_finds_nothing() {
        let registry = Registry::new();
        registry.add(ConnId::new(), "Alice".to_string(), writer()).await;
        assert!(registry.find_by_username("Zed").await.is_none());
        assert!(registry.find_all_by_username("Zed").await.is_empty());
    }

    #[tokio::test]
    async fn test_peers_can_exclude_one_connection() {
        let registry = Registry::new();
        let excluded = ConnId::new();
        registry.add(ConnId::new(), "Alice".to_string(), writer()).await;
        registry.add(excluded, "Bob".to_string(), writer()).await;
        registry.add(ConnId::new(), "Carol".to_string(), writer()).await;

        let peers = registry.peers(Some(excluded)).await;
        assert_eq!(peers.len(), 2);
        assert!(peers.iter().all(|u| u.conn_id != excluded));

        assert_eq!(registry.peers(None).await.len(), 3);
    }
}
