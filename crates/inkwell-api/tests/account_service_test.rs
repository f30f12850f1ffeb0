//! Account sign-in against the in-memory store.

use inkwell_api::services::AccountService;
use inkwell_core::mock::MemoryStorage;
use inkwell_core::{ConstraintKind, Error, OAuthAccountInput};

fn google(email: &str, subject: &str) -> OAuthAccountInput {
    OAuthAccountInput {
        email: email.to_string(),
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        provider: "google".to_string(),
        provider_account_id: subject.to_string(),
        thumbnail: None,
    }
}

#[tokio::test]
async fn test_sign_in_creates_then_reuses_account() {
    let storage = MemoryStorage::new();
    let accounts = AccountService::new(storage.clone());

    let first = accounts
        .sign_in(google("grace@example.com", "sub-1"))
        .await
        .unwrap();
    let second = accounts
        .sign_in(google("grace@example.com", "sub-1"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert!(second.is_active);
    assert_eq!(accounts.get(first.id).await.unwrap(), second);
}

#[tokio::test]
async fn test_sign_in_rejects_incomplete_profile() {
    let storage = MemoryStorage::new();
    let accounts = AccountService::new(storage.clone());

    for input in [
        google("not-an-email", "sub-1"),
        google("grace@example.com", "  "),
        OAuthAccountInput {
            provider: String::new(),
            ..google("grace@example.com", "sub-1")
        },
    ] {
        let err = accounts.sign_in(input).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "got {:?}", err);
    }
    assert_eq!(storage.tx_stats().begins, 0);
}

#[tokio::test]
async fn test_sign_in_with_email_of_other_identity_conflicts() {
    let storage = MemoryStorage::new();
    storage.seed_account("Ada", "Lovelace", "ada@example.com");
    let accounts = AccountService::new(storage);

    let err = accounts
        .sign_in(google("ada@example.com", "someone-else"))
        .await
        .unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::Unique));
}

#[tokio::test]
async fn test_sign_in_stores_trimmed_email() {
    let storage = MemoryStorage::new();
    let accounts = AccountService::new(storage.clone());

    let account = accounts
        .sign_in(google("  grace@example.com\t", "sub-1"))
        .await
        .unwrap();
    assert_eq!(account.email, "grace@example.com");
    assert_eq!(
        storage.account(account.id).unwrap().email,
        "grace@example.com"
    );

    let err = accounts
        .sign_in(google("grace@example.com", "sub-2"))
        .await
        .unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::Unique));
}
