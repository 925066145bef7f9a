use lablend::config::SecurityConfig;
use lablend::db::{LendingOutcome, NewAsset, Store};
use lablend::domain::{AssetId, AssetState, LedgerAction, Role, UserId};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

fn fast_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        ..SecurityConfig::default()
    }
}

async fn memory_store() -> Store {
    Store::new("sqlite::memory:").await.unwrap()
}

/// File-backed store so concurrent connections use real SQLite locking.
async fn file_store() -> (Store, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("lablend-test-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let store = Store::with_pool_options(&url, 8, 1).await.unwrap();
    (store, path)
}

async fn user(store: &Store, name: &str) -> UserId {
    store
        .create_user(name, "password123", Role::User, &fast_security())
        .await
        .unwrap()
        .unwrap()
        .id
}

async fn asset(store: &Store, name: &str) -> AssetId {
    store
        .add_asset(&NewAsset {
            name: name.to_string(),
            category: Some("Optics".to_string()),
            description: None,
        })
        .await
        .unwrap()
        .id
}

async fn assert_consistent(store: &Store) {
    for asset in store.list_assets().await.unwrap() {
        assert!(
            asset.state().is_some(),
            "asset {} has is_available={} assigned_to={:?}",
            asset.id,
            asset.is_available,
            asset.assigned_to
        );
    }
}

#[tokio::test]
async fn test_new_asset_is_available() {
    let store = memory_store().await;
    let id = asset(&store, "Microscope").await;

    let stored = store.get_asset(id).await.unwrap().unwrap();
    assert!(stored.is_available);
    assert_eq!(stored.assigned_to, None);
    assert_eq!(stored.state(), Some(AssetState::Available));
    assert_eq!(store.count_asset_transactions(id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_username_keeps_first_account() {
    let store = memory_store().await;
    let security = fast_security();

    let first = store
        .create_user("alice", "password123", Role::User, &security)
        .await
        .unwrap();
    assert!(first.is_some());

    let second = store
        .create_user("alice", "other-password", Role::Admin, &security)
        .await
        .unwrap();
    assert!(second.is_none());

    let stored = store.get_user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(stored.role, Role::User);
    assert!(
        store
            .verify_user_password("alice", "password123", &security)
            .await
            .unwrap()
            .is_some()
    );
    assert_eq!(store.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_check_out_then_check_in() {
    let store = memory_store().await;
    let alice = user(&store, "alice").await;
    let id = asset(&store, "Microscope").await;

    let LendingOutcome::Completed { asset, entry } = store.check_out_asset(id, alice).await.unwrap()
    else {
        panic!("check-out should succeed");
    };
    assert!(!asset.is_available);
    assert_eq!(asset.assigned_to, Some(alice));
    assert_eq!(entry.action, LedgerAction::CheckOut);
    assert_eq!(entry.user_id, alice);

    let LendingOutcome::Completed { asset, entry } = store.check_in_asset(id, alice).await.unwrap()
    else {
        panic!("check-in should succeed");
    };
    assert!(asset.is_available);
    assert_eq!(asset.assigned_to, None);
    assert_eq!(entry.action, LedgerAction::CheckIn);

    let history = store.get_asset_history(id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, LedgerAction::CheckOut);
    assert_eq!(history[1].action, LedgerAction::CheckIn);
    assert_eq!(history[0].username.as_deref(), Some("alice"));
    assert_eq!(history[0].asset_name.as_deref(), Some("Microscope"));
}

#[tokio::test]
async fn test_rejected_transitions_leave_no_trace() {
    let store = memory_store().await;
    let alice = user(&store, "alice").await;
    let bob = user(&store, "bob").await;
    let id = asset(&store, "Microscope").await;

    // Returning an available asset
    assert!(matches!(
        store.check_in_asset(id, alice).await.unwrap(),
        LendingOutcome::NotAssignee
    ));

    store.check_out_asset(id, alice).await.unwrap();

    assert!(matches!(
        store.check_out_asset(id, bob).await.unwrap(),
        LendingOutcome::Unavailable
    ));
    assert!(matches!(
        store.check_out_asset(id, alice).await.unwrap(),
        LendingOutcome::Unavailable
    ));
    assert!(matches!(
        store.check_in_asset(id, bob).await.unwrap(),
        LendingOutcome::NotAssignee
    ));

    let stored = store.get_asset(id).await.unwrap().unwrap();
    assert_eq!(stored.assigned_to, Some(alice));
    assert_eq!(store.count_asset_transactions(id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_missing_asset() {
    let store = memory_store().await;
    let alice = user(&store, "alice").await;

    assert!(matches!(
        store.check_out_asset(AssetId::new(42), alice).await.unwrap(),
        LendingOutcome::NotFound
    ));
    assert!(matches!(
        store.check_in_asset(AssetId::new(42), alice).await.unwrap(),
        LendingOutcome::NotFound
    ));
}

#[tokio::test]
async fn test_store_matches_state_model() {
    let store = memory_store().await;
    let users = [user(&store, "alice").await, user(&store, "bob").await];
    let id = asset(&store, "Microscope").await;

    let mut model = AssetState::Available;
    let mut recorded = 0;

    let script = [
        (LedgerAction::CheckIn, 0),
        (LedgerAction::CheckOut, 0),
        (LedgerAction::CheckOut, 1),
        (LedgerAction::CheckIn, 1),
        (LedgerAction::CheckIn, 0),
        (LedgerAction::CheckOut, 1),
        (LedgerAction::CheckOut, 1),
        (LedgerAction::CheckIn, 1),
    ];

    for (action, who) in script {
        let actor = users[who];
        let outcome = match action {
            LedgerAction::CheckOut => store.check_out_asset(id, actor).await.unwrap(),
            LedgerAction::CheckIn => store.check_in_asset(id, actor).await.unwrap(),
        };

        match model.apply(action, actor) {
            Ok(next) => {
                assert!(
                    matches!(outcome, LendingOutcome::Completed { .. }),
                    "{action} by {actor} should succeed from {model:?}"
                );
                model = next;
                recorded += 1;
            }
            Err(_) => assert!(
                !matches!(outcome, LendingOutcome::Completed { .. }),
                "{action} by {actor} should fail from {model:?}"
            ),
        }

        let stored = store.get_asset(id).await.unwrap().unwrap();
        assert_eq!(stored.state(), Some(model));
        assert_eq!(store.count_asset_transactions(id).await.unwrap(), recorded);
    }
}

#[tokio::test]
async fn test_user_history_is_newest_first() {
    let store = memory_store().await;
    let alice = user(&store, "alice").await;
    let first = asset(&store, "Microscope").await;
    let second = asset(&store, "Centrifuge").await;

    store.check_out_asset(first, alice).await.unwrap();
    store.check_out_asset(second, alice).await.unwrap();

    let history = store.get_user_history(alice).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].asset_id, second);
    assert_eq!(history[1].asset_id, first);

    let assigned = store.list_assets_assigned_to(alice).await.unwrap();
    assert_eq!(assigned.len(), 2);

    let recent = store.get_recent_transactions(1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].asset_id, second);
}

#[tokio::test]
async fn test_inconsistent_asset_row_is_rejected() {
    let store = memory_store().await;
    let id = asset(&store, "Microscope").await;

    let result = store
        .conn
        .execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("UPDATE assets SET is_available = 0 WHERE id = {id}"),
        ))
        .await;
    assert!(result.is_err());

    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_transactions_are_append_only() {
    let store = memory_store().await;
    let alice = user(&store, "alice").await;
    let id = asset(&store, "Microscope").await;
    store.check_out_asset(id, alice).await.unwrap();

    let update = store
        .conn
        .execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "UPDATE transactions SET action = 'check-in'".to_string(),
        ))
        .await;
    assert!(update.is_err());

    let delete = store
        .conn
        .execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "DELETE FROM transactions".to_string(),
        ))
        .await;
    assert!(delete.is_err());

    assert_eq!(store.count_asset_transactions(id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_ledger_rows_pin_their_asset_and_user() {
    let store = memory_store().await;
    let alice = user(&store, "alice").await;
    let id = asset(&store, "Microscope").await;
    store.check_out_asset(id, alice).await.unwrap();
    store.check_in_asset(id, alice).await.unwrap();

    for sql in [
        format!("DELETE FROM assets WHERE id = {id}"),
        format!("DELETE FROM users WHERE id = {alice}"),
    ] {
        let result = store
            .conn
            .execute(Statement::from_string(DatabaseBackend::Sqlite, sql.clone()))
            .await;
        assert!(result.is_err(), "{sql} should be refused");
    }

    assert!(store.get_asset(id).await.unwrap().is_some());
    assert_eq!(store.count_asset_transactions(id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_unknown_username_costs_a_hash() {
    let store = memory_store().await;
    let security = SecurityConfig {
        argon2_memory_cost_kib: 8192,
        argon2_time_cost: 2,
        ..SecurityConfig::default()
    };
    store
        .create_user("alice", "password123", Role::User, &security)
        .await
        .unwrap()
        .unwrap();

    let started = std::time::Instant::now();
    let known = store
        .verify_user_password("alice", "wrong-password", &security)
        .await
        .unwrap();
    let known_elapsed = started.elapsed();

    let started = std::time::Instant::now();
    let unknown = store
        .verify_user_password("mallory", "wrong-password", &security)
        .await
        .unwrap();
    let unknown_elapsed = started.elapsed();

    assert!(known.is_none());
    assert!(unknown.is_none());
    assert!(
        unknown_elapsed * 4 >= known_elapsed,
        "unknown user answered in {unknown_elapsed:?}, known user in {known_elapsed:?}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_check_outs_have_one_winner() {
    let (store, path) = file_store().await;
    let id = asset(&store, "Microscope").await;

    let mut contenders = Vec::new();
    for i in 0..4 {
        contenders.push(user(&store, &format!("user{i}")).await);
    }

    let handles: Vec<_> = contenders
        .into_iter()
        .map(|who| {
            let store = store.clone();
            tokio::spawn(async move { store.check_out_asset(id, who).await })
        })
        .collect();

    let mut winners = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            LendingOutcome::Completed { .. } => winners += 1,
            LendingOutcome::Unavailable => refused += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(refused, 3);
    assert_eq!(store.count_asset_transactions(id).await.unwrap(), 1);
    assert_consistent(&store).await;

    drop(store);
    let _ = std::fs::remove_file(path);
}
