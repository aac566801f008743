use chrono::Utc;
use uuid::Uuid;

use doorman_auth::crypto::{DeterministicIndexer, SecretHasher};
use doorman_auth::domain::repository::RecoveryCodeRepository;
use doorman_auth::domain::types::RecoveryCode;
use doorman_auth::error::AuthServiceError;
use doorman_auth::usecase::recovery::{RecoverInput, RecoverUseCase};

use crate::helpers::{
    MockBindingRepo, MockRecoveryCodeRepo, MockUserRepo, fast_hasher, linked_binding,
    test_indexer, test_user,
};

fn seed_codes(
    user_id: i64,
    plaintexts: &[&str],
    hasher: &SecretHasher,
    indexer: &DeterministicIndexer,
) -> Vec<RecoveryCode> {
    plaintexts
        .iter()
        .map(|code| RecoveryCode {
            id: Uuid::new_v4(),
            user_id,
            code_digest: hasher.digest(code).unwrap(),
            code_index: indexer.index(code),
            used_at: None,
            created_at: Utc::now(),
        })
        .collect()
}

const CODES: [&str; 8] = [
    "RC-AAAA-2222",
    "RC-BBBB-3333",
    "RC-CCCC-4444",
    "RC-DDDD-5555",
    "RC-EEEE-6666",
    "RC-FFFF-7777",
    "RC-GGGG-8888",
    "RC-HHHH-9999",
];

#[tokio::test]
async fn should_consume_code_once_and_revoke_binding() {
    let hasher = fast_hasher();
    let indexer = test_indexer();
    let user = test_user(5, &hasher);
    let bindings = MockBindingRepo::new(vec![linked_binding(5, "chat-55")]);
    let rows = bindings.rows_handle();

    let uc = RecoverUseCase {
        users: MockUserRepo::new(vec![user]),
        codes: MockRecoveryCodeRepo::new(seed_codes(5, &CODES, &hasher, &indexer)),
        bindings,
        hasher,
        indexer,
    };

    let user_id = uc
        .execute(RecoverInput {
            identifier: "user5".to_owned(),
            recovery_code: "RC-CCCC-4444".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(user_id, 5);

    // The binding is cleared so the subject must link again.
    {
        let rows = rows.lock().unwrap();
        assert!(rows[0].chat_id.is_none());
        assert!(!rows[0].is_verified);
    }

    // The code is spent, for this or any other caller.
    let again = uc
        .execute(RecoverInput {
            identifier: "user5".to_owned(),
            recovery_code: "RC-CCCC-4444".to_owned(),
        })
        .await;
    assert!(
        matches!(again, Err(AuthServiceError::InvalidOrExpired)),
        "expected InvalidOrExpired, got {again:?}"
    );
}

#[tokio::test]
async fn should_reject_code_belonging_to_another_subject() {
    let hasher = fast_hasher();
    let indexer = test_indexer();
    let users = MockUserRepo::new(vec![test_user(5, &hasher), test_user(6, &hasher)]);

    let uc = RecoverUseCase {
        users,
        codes: MockRecoveryCodeRepo::new(seed_codes(5, &CODES, &hasher, &indexer)),
        bindings: MockBindingRepo::empty(),
        hasher,
        indexer,
    };

    let result = uc
        .execute(RecoverInput {
            identifier: "user6".to_owned(),
            recovery_code: "RC-AAAA-2222".to_owned(),
        })
        .await;

    assert!(matches!(result, Err(AuthServiceError::InvalidOrExpired)));
}

#[tokio::test]
async fn should_surface_not_found_for_unknown_identifier() {
    let uc = RecoverUseCase {
        users: MockUserRepo::empty(),
        codes: MockRecoveryCodeRepo::empty(),
        bindings: MockBindingRepo::empty(),
        hasher: fast_hasher(),
        indexer: test_indexer(),
    };

    let result = uc
        .execute(RecoverInput {
            identifier: "nobody".to_owned(),
            recovery_code: "RC-AAAA-2222".to_owned(),
        })
        .await;

    assert!(matches!(result, Err(AuthServiceError::UserNotFound)));
}

#[tokio::test]
async fn should_fall_back_to_scan_when_stored_index_is_stale() {
    let hasher = fast_hasher();
    let indexer = test_indexer();
    let user = test_user(5, &hasher);

    let mut records = seed_codes(5, &CODES, &hasher, &indexer);
    // Records written before the index column existed.
    for record in &mut records {
        record.code_index = String::new();
    }

    let uc = RecoverUseCase {
        users: MockUserRepo::new(vec![user]),
        codes: MockRecoveryCodeRepo::new(records),
        bindings: MockBindingRepo::new(vec![linked_binding(5, "chat-55")]),
        hasher,
        indexer,
    };

    let user_id = uc
        .execute(RecoverInput {
            identifier: "user5".to_owned(),
            recovery_code: "RC-BBBB-3333".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(user_id, 5);
}

#[tokio::test]
async fn index_lookup_and_scan_locate_the_same_record() {
    let hasher = fast_hasher();
    let indexer = test_indexer();
    let codes = MockRecoveryCodeRepo::new(seed_codes(5, &CODES, &hasher, &indexer));

    let target = "RC-FFFF-7777";
    let by_index: Vec<_> = codes
        .find_by_index(5, &indexer.index(target))
        .await
        .unwrap()
        .into_iter()
        .filter(|c| hasher.verify(target, &c.code_digest))
        .collect();
    let by_scan: Vec<_> = codes
        .find_unused(5)
        .await
        .unwrap()
        .into_iter()
        .filter(|c| hasher.verify(target, &c.code_digest))
        .collect();

    assert_eq!(by_index.len(), 1);
    assert_eq!(by_scan.len(), 1);
    assert_eq!(by_index[0].id, by_scan[0].id);
}
