use doorman_auth::error::AuthServiceError;
use doorman_auth::usecase::register::{RegisterInput, RegisterUseCase};

use crate::helpers::{MockBindingRepo, MockUserRepo, fast_hasher};

#[tokio::test]
async fn should_create_user_and_empty_binding_placeholder() {
    let users = MockUserRepo::empty();
    let bindings = MockBindingRepo::empty();
    let users_handle = users.users_handle();
    let rows_handle = bindings.rows_handle();

    let uc = RegisterUseCase {
        users,
        bindings,
        hasher: fast_hasher(),
    };
    let user = uc
        .execute(RegisterInput {
            email: "alice@example.com".to_owned(),
            username: "alice".to_owned(),
            password: "s3cret-enough".to_owned(),
        })
        .await
        .unwrap();

    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.username, "alice");
    assert!(user.is_active);
    // Stored salted, never plaintext; still verifiable.
    assert_ne!(user.password_digest, "s3cret-enough");
    assert!(fast_hasher().verify("s3cret-enough", &user.password_digest));

    assert_eq!(users_handle.lock().unwrap().len(), 1);

    let rows = rows_handle.lock().unwrap();
    assert_eq!(rows.len(), 1, "registration must seed the binding row");
    assert_eq!(rows[0].user_id, user.id);
    assert!(rows[0].chat_id.is_none());
    assert!(!rows[0].is_verified);
}

#[tokio::test]
async fn should_reject_duplicate_identity() {
    let uc = RegisterUseCase {
        users: MockUserRepo::empty(),
        bindings: MockBindingRepo::empty(),
        hasher: fast_hasher(),
    };

    uc.execute(RegisterInput {
        email: "alice@example.com".to_owned(),
        username: "alice".to_owned(),
        password: "s3cret-enough".to_owned(),
    })
    .await
    .unwrap();

    let result = uc
        .execute(RegisterInput {
            email: "alice@example.com".to_owned(),
            username: "alice2".to_owned(),
            password: "s3cret-enough".to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::UserExists)),
        "expected UserExists, got {result:?}"
    );
}
