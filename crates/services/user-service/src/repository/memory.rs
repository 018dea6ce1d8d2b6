//! In-memory unit of work.
//!
//! A scope reads from a private copy of the store and journals every write.
//! `commit` replays the journal onto the latest committed state under one
//! lock, so concurrent scopes never overwrite each other's changes; a replay
//! that hits a conflict commits nothing. User ids come from a shared counter
//! and are never reused, even when a scope rolls back.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::unit_of_work::{UnitOfWork, UnitOfWorkScope};
use super::user_log_repository::UserLogRepository;
use super::user_repository::UserRepository;
use common::{AppError, AppResult, Paginated, PaginationParams};
use domain::{AuditEvent, HashedCredentials, SignedInIdentity, UserModel, UserRecord};

#[derive(Debug, Clone, Default)]
struct State {
    users: BTreeMap<i64, UserRecord>,
    logs: Vec<AuditEvent>,
}

/// One journaled write.
#[derive(Debug, Clone)]
enum Write {
    AddUser(UserRecord),
    UpdateUser(UserRecord),
    DeleteUser(i64),
    AppendLog(AuditEvent),
}

impl State {
    fn login_taken(&self, login_hash: &str, except: i64) -> bool {
        self.users
            .values()
            .any(|u| u.login_hash == login_hash && u.user_id != except)
    }

    /// Apply one write, enforcing the same rules as the database schema.
    fn apply(&mut self, write: &Write) -> AppResult<()> {
        match write {
            Write::AddUser(record) => {
                if self.login_taken(&record.login_hash, record.user_id) {
                    return Err(AppError::conflict("Login"));
                }
                self.users.insert(record.user_id, record.clone());
            }
            Write::UpdateUser(record) => {
                if !self.users.contains_key(&record.user_id) {
                    return Err(AppError::NotFound);
                }
                if self.login_taken(&record.login_hash, record.user_id) {
                    return Err(AppError::conflict("Login"));
                }
                self.users.insert(record.user_id, record.clone());
            }
            Write::DeleteUser(user_id) => {
                self.users.remove(user_id).ok_or(AppError::NotFound)?;
            }
            Write::AppendLog(event) => self.logs.push(event.clone()),
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    last_id: AtomicI64,
    fail_commits: AtomicBool,
    begins: AtomicUsize,
    commits: AtomicUsize,
}

impl Inner {
    fn next_id(&self) -> i64 {
        self.last_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable handle to one in-memory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent commit fail with a persistence error.
    pub fn fail_commits(&self, fail: bool) {
        self.inner.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Committed record, credential hashes included
    pub fn record(&self, user_id: i64) -> Option<UserRecord> {
        lock(&self.inner.state).users.get(&user_id).cloned()
    }

    pub fn user_count(&self) -> usize {
        lock(&self.inner.state).users.len()
    }

    /// Every committed audit event, in commit order
    pub fn audit_events(&self) -> Vec<AuditEvent> {
        lock(&self.inner.state).logs.clone()
    }

    pub fn begin_count(&self) -> usize {
        self.inner.begins.load(Ordering::SeqCst)
    }

    pub fn commit_count(&self) -> usize {
        self.inner.commits.load(Ordering::SeqCst)
    }

    fn repository(&self) -> MemoryRepository<'static> {
        MemoryRepository {
            target: Target::Committed(self.inner.clone()),
        }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryStore {
    fn users(&self) -> Arc<dyn UserRepository> {
        Arc::new(self.repository())
    }

    fn user_logs(&self) -> Arc<dyn UserLogRepository> {
        Arc::new(self.repository())
    }

    async fn begin(&self) -> AppResult<Box<dyn UnitOfWorkScope>> {
        self.inner.begins.fetch_add(1, Ordering::SeqCst);
        let snapshot = lock(&self.inner.state).clone();
        Ok(Box::new(MemoryScope {
            inner: self.inner.clone(),
            staged: Mutex::new(Staged {
                state: snapshot,
                journal: Vec::new(),
            }),
        }))
    }
}

struct Staged {
    state: State,
    journal: Vec<Write>,
}

struct MemoryScope {
    inner: Arc<Inner>,
    staged: Mutex<Staged>,
}

impl MemoryScope {
    fn repository(&self) -> MemoryRepository<'_> {
        MemoryRepository {
            target: Target::Scope(self),
        }
    }
}

#[async_trait]
impl UnitOfWorkScope for MemoryScope {
    fn users(&self) -> Box<dyn UserRepository + '_> {
        Box::new(self.repository())
    }

    fn user_logs(&self) -> Box<dyn UserLogRepository + '_> {
        Box::new(self.repository())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryScope { inner, staged } = *self;

        if inner.fail_commits.load(Ordering::SeqCst) {
            return Err(AppError::persistence("Commit rejected by in-memory store"));
        }

        let journal = staged
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .journal;

        let mut committed = lock(&inner.state);
        let mut next = committed.clone();
        for write in &journal {
            next.apply(write)?;
        }
        *committed = next;
        drop(committed);

        inner.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

enum Target<'a> {
    Committed(Arc<Inner>),
    Scope(&'a MemoryScope),
}

/// Repository view over either the committed state or a scope.
struct MemoryRepository<'a> {
    target: Target<'a>,
}

impl MemoryRepository<'_> {
    fn inner(&self) -> &Inner {
        match &self.target {
            Target::Committed(inner) => inner.as_ref(),
            Target::Scope(scope) => scope.inner.as_ref(),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        match &self.target {
            Target::Committed(inner) => f(&lock(&inner.state)),
            Target::Scope(scope) => f(&lock(&scope.staged).state),
        }
    }

    fn write(&self, write: Write) -> AppResult<()> {
        match &self.target {
            Target::Committed(inner) => lock(&inner.state).apply(&write),
            Target::Scope(scope) => {
                let mut staged = lock(&scope.staged);
                staged.state.apply(&write)?;
                staged.journal.push(write);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl<'a> UserRepository for MemoryRepository<'a> {
    async fn verify_sign_in(
        &self,
        credentials: &HashedCredentials,
    ) -> AppResult<Option<SignedInIdentity>> {
        Ok(self.read(|state| {
            state
                .users
                .values()
                .find(|u| {
                    u.is_active()
                        && u.login_hash == credentials.login_hash
                        && u.password_hash == credentials.password_hash
                })
                .map(|u| SignedInIdentity::new(u.user_id, u.roles.clone()))
        }))
    }

    async fn add(&self, mut record: UserRecord) -> AppResult<i64> {
        if self.read(|state| state.login_taken(&record.login_hash, 0)) {
            return Err(AppError::conflict("Login"));
        }

        record.user_id = self.inner().next_id();
        let user_id = record.user_id;
        self.write(Write::AddUser(record))?;
        Ok(user_id)
    }

    async fn update(&self, user_id: i64, mut record: UserRecord) -> AppResult<()> {
        record.user_id = user_id;
        self.write(Write::UpdateUser(record))
    }

    async fn delete(&self, user_id: i64) -> AppResult<()> {
        self.write(Write::DeleteUser(user_id))
    }

    async fn select(&self, user_id: i64) -> AppResult<Option<UserModel>> {
        Ok(self.read(|state| state.users.get(&user_id).map(UserModel::from)))
    }

    async fn select_record(&self, user_id: i64) -> AppResult<Option<UserRecord>> {
        Ok(self.read(|state| state.users.get(&user_id).cloned()))
    }

    async fn list(&self) -> AppResult<Vec<UserModel>> {
        Ok(self.read(|state| state.users.values().map(UserModel::from).collect()))
    }

    async fn list_paged(&self, params: PaginationParams) -> AppResult<Paginated<UserModel>> {
        let skip = usize::try_from(params.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(params.limit()).unwrap_or(usize::MAX);

        Ok(self.read(|state| {
            let data = state
                .users
                .values()
                .skip(skip)
                .take(take)
                .map(UserModel::from)
                .collect();
            Paginated::from_params(data, &params, state.users.len() as u64)
        }))
    }
}

#[async_trait]
impl<'a> UserLogRepository for MemoryRepository<'a> {
    async fn add(&self, event: AuditEvent) -> AppResult<()> {
        self.write(Write::AppendLog(event))
    }

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<AuditEvent>> {
        let mut events: Vec<AuditEvent> = self.read(|state| {
            state
                .logs
                .iter()
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect()
        });
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{AuditKind, Role, Roles, UserStatus};

    fn record(login: &str) -> UserRecord {
        UserRecord {
            user_id: 0,
            name: "Alice".to_string(),
            surname: "Liddell".to_string(),
            email: "alice@example.com".to_string(),
            login_hash: format!("{}-hash", login),
            password_hash: "password-hash".to_string(),
            roles: Roles::single(Role::User),
            status: UserStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_scope_changes_invisible_until_commit() {
        let store = InMemoryStore::new();
        let scope = store.begin().await.unwrap();
        let id = scope.users().add(record("alice")).await.unwrap();

        assert_eq!(id, 1);
        assert!(store.record(1).is_none());

        scope.commit().await.unwrap();
        assert_eq!(store.record(1).unwrap().login_hash, "alice-hash");
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_scope_rolls_back() {
        let store = InMemoryStore::new();
        {
            let scope = store.begin().await.unwrap();
            scope.users().add(record("alice")).await.unwrap();
        }
        assert_eq!(store.user_count(), 0);
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_commit_persists_nothing() {
        let store = InMemoryStore::new();
        store.fail_commits(true);

        let scope = store.begin().await.unwrap();
        scope.user_logs().add(AuditEvent::login(1)).await.unwrap();

        assert!(matches!(scope.commit().await, Err(AppError::Persistence(_))));
        assert!(store.audit_events().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_login_conflicts() {
        let store = InMemoryStore::new();
        let users = store.users();
        users.add(record("alice")).await.unwrap();

        let err = users.add(record("alice")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_inactive_users_cannot_sign_in() {
        let store = InMemoryStore::new();
        let mut inactive = record("bob");
        inactive.status = UserStatus::Inactive;
        store.users().add(inactive).await.unwrap();

        let hashed = HashedCredentials {
            login_hash: "bob-hash".to_string(),
            password_hash: "password-hash".to_string(),
        };
        assert!(store.users().verify_sign_in(&hashed).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logs_listed_per_user() {
        let store = InMemoryStore::new();
        let logs = store.user_logs();
        logs.add(AuditEvent::login(1)).await.unwrap();
        logs.add(AuditEvent::login(2)).await.unwrap();
        logs.add(AuditEvent::logout(1)).await.unwrap();

        let kinds: Vec<AuditKind> = logs
            .list_by_user(1)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![AuditKind::Login, AuditKind::Logout]);
    }

    #[tokio::test]
    async fn test_overlapping_scopes_keep_both_writes() {
        let store = InMemoryStore::new();
        let first = store.begin().await.unwrap();
        let second = store.begin().await.unwrap();

        let alice = first.users().add(record("alice")).await.unwrap();
        let bob = second.users().add(record("bob")).await.unwrap();
        first.user_logs().add(AuditEvent::login(alice)).await.unwrap();
        second.user_logs().add(AuditEvent::login(bob)).await.unwrap();

        first.commit().await.unwrap();
        second.commit().await.unwrap();

        assert_ne!(alice, bob);
        assert_eq!(store.user_count(), 2);
        assert_eq!(store.audit_events().len(), 2);
    }

    #[tokio::test]
    async fn test_conflicting_replay_commits_nothing() {
        let store = InMemoryStore::new();
        let first = store.begin().await.unwrap();
        let second = store.begin().await.unwrap();

        first.users().add(record("alice")).await.unwrap();
        second.users().add(record("alice")).await.unwrap();
        second.user_logs().add(AuditEvent::login(9)).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.user_count(), 1);
        assert!(store.audit_events().is_empty());
    }

    #[tokio::test]
    async fn test_update_of_user_deleted_meanwhile_fails() {
        let store = InMemoryStore::new();
        let id = store.users().add(record("alice")).await.unwrap();

        let scope = store.begin().await.unwrap();
        let mut changed = record("alice");
        changed.name = "Alicia".to_string();
        scope.users().update(id, changed).await.unwrap();

        store.users().delete(id).await.unwrap();

        assert!(matches!(scope.commit().await, Err(AppError::NotFound)));
        assert!(store.record(id).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_commits_lose_nothing() {
        let store = InMemoryStore::new();
        let tasks: Vec<_> = (0..16)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    let scope = store.begin().await.unwrap();
                    scope.users().add(record(&format!("user{}", n))).await.unwrap();
                    scope.commit().await.unwrap();
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(store.user_count(), 16);
        assert_eq!(store.commit_count(), 16);
    }
}
