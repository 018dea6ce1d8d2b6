//! User service tests against the in-memory unit of work.

use std::sync::Arc;

use tokio_test::{assert_err, assert_ok};

use common::{AppError, PaginationParams};
use domain::{
    AddUserModel, CredentialHasher, Role, Roles, Sha512Hasher, UpdateUserModel, UserStatus,
    MAX_PAGE_NUMBER,
};
use user_service_lib::repository::InMemoryStore;
use user_service_lib::service::{UserManager, UserService};

const SALT: &str = "integration-test-salt";

fn setup() -> (InMemoryStore, UserManager) {
    let store = InMemoryStore::new();
    let service = UserManager::new(Arc::new(store.clone()), Arc::new(Sha512Hasher::new(SALT)));
    (store, service)
}

fn alice() -> AddUserModel {
    AddUserModel::new("Alice", "Liddell", "alice@example.com", "alice", "Passw0rd!")
}

fn update_for(user_id: i64) -> UpdateUserModel {
    UpdateUserModel {
        user_id,
        name: "Alicia".to_string(),
        surname: "Liddell".to_string(),
        email: "alicia@example.com".to_string(),
        roles: [Role::User, Role::Admin].into_iter().collect(),
        status: UserStatus::Active,
    }
}

#[tokio::test]
async fn test_add_stores_hashed_credentials() {
    let (store, service) = setup();

    let user_id = assert_ok!(service.add(alice()).await);
    assert_eq!(user_id, 1);

    let record = store.record(user_id).unwrap();
    let hasher = Sha512Hasher::new(SALT);
    assert_ne!(record.login_hash, "alice");
    assert_ne!(record.password_hash, "Passw0rd!");
    assert_eq!(record.login_hash, hasher.hash("alice").unwrap());
    assert_eq!(record.password_hash, hasher.hash("Passw0rd!").unwrap());
    assert_eq!(record.roles, Roles::single(Role::User));
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn test_add_rejects_invalid_input_without_touching_store() {
    let (store, service) = setup();

    let mut model = alice();
    model.email = "alice-at-example".to_string();
    let err = assert_err!(service.add(model).await);

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.begin_count(), 0);
    assert_eq!(store.user_count(), 0);
}

#[tokio::test]
async fn test_add_duplicate_login_conflicts() {
    let (_store, service) = setup();
    assert_ok!(service.add(alice()).await);

    let err = assert_err!(service.add(alice()).await);
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_update_keeps_stored_credentials() {
    let (store, service) = setup();
    let user_id = service.add(alice()).await.unwrap();
    let before = store.record(user_id).unwrap();

    assert_ok!(service.update(update_for(user_id)).await);

    let after = store.record(user_id).unwrap();
    assert_eq!(after.login_hash, before.login_hash);
    assert_eq!(after.password_hash, before.password_hash);
    assert_eq!(after.name, "Alicia");
    assert_eq!(after.email, "alicia@example.com");
    assert!(after.roles.is_admin());
}

#[tokio::test]
async fn test_update_missing_user_is_not_found() {
    let (store, service) = setup();

    let err = assert_err!(service.update(update_for(42)).await);
    assert!(matches!(err, AppError::NotFound));
    assert_eq!(store.commit_count(), 0);
}

#[tokio::test]
async fn test_delete() {
    let (store, service) = setup();
    let user_id = service.add(alice()).await.unwrap();

    assert_ok!(service.delete(user_id).await);
    assert!(store.record(user_id).is_none());

    let err = assert_err!(service.delete(user_id).await);
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn test_select_returns_view() {
    let (_store, service) = setup();
    let user_id = service.add(alice()).await.unwrap();

    let view = assert_ok!(service.select(user_id).await);
    assert_eq!(view.user_id, user_id);
    assert_eq!(view.email, "alice@example.com");
    assert_eq!(view.status, UserStatus::Active);

    let err = assert_err!(service.select(user_id + 1).await);
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn test_list_and_list_paged() {
    let (_store, service) = setup();
    for login in ["alice", "bob", "carol"] {
        let email = format!("{}@example.com", login);
        let model = AddUserModel::new("Name", "Surname", email, login, "Passw0rd!");
        service.add(model).await.unwrap();
    }

    let all = service.list().await.unwrap();
    assert_eq!(all.len(), 3);

    let page = service.list_paged(PaginationParams::new(2, 2)).await.unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].email, "carol@example.com");
    assert_eq!(page.meta.total, 3);
    assert_eq!(page.meta.total_pages, 2);
}

#[tokio::test]
async fn test_list_paged_far_past_the_end_is_empty() {
    let (_store, service) = setup();
    service.add(alice()).await.unwrap();

    let page = assert_ok!(service.list_paged(PaginationParams::new(u64::MAX, 10)).await);
    assert!(page.data.is_empty());
    assert_eq!(page.meta.total, 1);
    assert_eq!(page.meta.page, MAX_PAGE_NUMBER);
}

#[tokio::test]
async fn test_commit_failure_persists_nothing() {
    let (store, service) = setup();
    store.fail_commits(true);

    let err = assert_err!(service.add(alice()).await);
    assert!(matches!(err, AppError::Persistence(_)));
    assert_eq!(store.user_count(), 0);
}
