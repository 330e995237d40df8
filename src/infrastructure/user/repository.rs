//! In-memory user repository implementation

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::user::{NewUser, User, UserId, UserRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct UserTable {
    users: HashMap<UserId, User>,
    /// Index for username -> user ID lookup
    username_index: HashMap<String, UserId>,
    next_id: i64,
}

/// In-memory implementation of UserRepository
///
/// The rows and the username index live behind one lock so that the
/// uniqueness check and the insert happen in the same critical section.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    table: Arc<RwLock<UserTable>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.table.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, DomainError> {
        let mut table = self.table.write().await;

        if table.username_index.contains_key(&new_user.username) {
            return Err(DomainError::conflict(format!(
                "Username '{}' already exists",
                new_user.username
            )));
        }

        table.next_id += 1;
        let id = UserId::new(table.next_id);
        let user = User::new(id, new_user.username, new_user.password_hash, Utc::now());

        table.username_index.insert(user.username().to_string(), id);
        table.users.insert(id, user.clone());

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let table = self.table.read().await;

        Ok(table
            .username_index
            .get(username)
            .and_then(|id| table.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let table = self.table.read().await;
        Ok(table.users.get(id).cloned())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryUserRepository::new();

        let first = repo.create(NewUser::new("alice", "hash-a")).await.unwrap();
        let second = repo.create(NewUser::new("bob", "hash-b")).await.unwrap();

        assert_eq!(first.id().value(), 1);
        assert_eq!(second.id().value(), 2);
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_find_by_username_and_id() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(NewUser::new("alice", "hash-a")).await.unwrap();

        let by_name = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id(), user.id());
        assert_eq!(by_name.password_hash(), "hash-a");

        let by_id = repo.find_by_id(&user.id()).await.unwrap().unwrap();
        assert_eq!(by_id.username(), "alice");
    }

    #[tokio::test]
    async fn test_missing_user_is_none() {
        let repo = InMemoryUserRepository::new();

        assert!(repo.find_by_username("ghost").await.unwrap().is_none());
        assert!(repo.find_by_id(&UserId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_username_uniqueness() {
        let repo = InMemoryUserRepository::new();

        repo.create(NewUser::new("alice", "hash-a")).await.unwrap();
        let result = repo.create(NewUser::new("alice", "hash-b")).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let repo = InMemoryUserRepository::new();

        repo.create(NewUser::new("alice", "hash-a")).await.unwrap();
        repo.create(NewUser::new("Alice", "hash-b")).await.unwrap();

        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_single_winner() {
        let repo = InMemoryUserRepository::new();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.create(NewUser::new("racer", format!("hash-{}", i))).await
                })
            })
            .collect();

        let mut successes = 0;
        let mut conflicts = 0;

        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(DomainError::Conflict { .. }) => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(repo.len().await, 1);
    }
}
