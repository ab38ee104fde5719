use super::*;
use crate::remote::{AuthEventKind, ErrorKind};
use crate::test_support::MockRemote;

const LIMIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn short_password_is_rejected_locally() {
    let mock = MockRemote::new();
    mock.establish(AuthEventKind::SignedIn);
    let mut settings = AccountSettings::new();
    settings.open();

    let err = settings.update_password(mock.as_ref(), "12345", LIMIT).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(settings.message().is_some_and(FlowMessage::is_error));
    assert!(!mock.calls().contains(&"update_password"));
}

#[tokio::test]
async fn password_update_leaves_recovery_mode() {
    let mock = MockRemote::new();
    mock.establish(AuthEventKind::PasswordRecovery);
    let mut settings = AccountSettings::new();
    settings.open_recovery();
    assert!(settings.in_recovery());

    settings.update_password(mock.as_ref(), "brand-new-pass", LIMIT).await.unwrap();
    assert!(!settings.in_recovery());
    assert!(settings.is_open());
    assert_eq!(settings.message(), Some(&FlowMessage::Success("Password updated.".into())));
}

#[tokio::test]
async fn password_update_error_is_shown_verbatim() {
    let mock = MockRemote::new();
    let mut settings = AccountSettings::new();
    settings.open_recovery();

    let err = settings.update_password(mock.as_ref(), "brand-new-pass", LIMIT).await.unwrap_err();
    assert_eq!(err.message, "auth session missing");
    assert!(settings.in_recovery());
    assert_eq!(settings.message().map(FlowMessage::text), Some("auth session missing"));
}

#[tokio::test]
async fn delete_requires_confirmation() {
    let mock = MockRemote::new();
    let session = mock.establish(AuthEventKind::SignedIn);
    let mut settings = AccountSettings::new();
    settings.open();

    let err = settings.delete_account(mock.as_ref(), Some(&session), false, LIMIT).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(!mock.calls().contains(&"delete_account"));
}

#[tokio::test]
async fn delete_is_blocked_in_recovery_mode() {
    let mock = MockRemote::new();
    let session = mock.establish(AuthEventKind::PasswordRecovery);
    let mut settings = AccountSettings::new();
    settings.open_recovery();

    assert!(settings.delete_account(mock.as_ref(), Some(&session), true, LIMIT).await.is_err());
    assert!(mock.current_session().is_some());
    assert!(!mock.calls().contains(&"delete_account"));
}

#[tokio::test]
async fn delete_without_session_fails() {
    let mock = MockRemote::new();
    let mut settings = AccountSettings::new();
    settings.open();

    let err = settings.delete_account(mock.as_ref(), None, true, LIMIT).await.unwrap_err();
    assert_eq!(err, ServiceError::session_missing());
}

#[tokio::test]
async fn confirmed_delete_removes_rows_and_closes_panel() {
    let mock = MockRemote::new();
    let session = mock.establish(AuthEventKind::SignedIn);
    mock.seed_saved(mock.user_id(), "1");
    let mut settings = AccountSettings::new();
    settings.open();

    settings.delete_account(mock.as_ref(), Some(&session), true, LIMIT).await.unwrap();
    assert!(!settings.is_open());
    assert!(mock.saved_for(mock.user_id()).is_empty());
    assert!(mock.current_session().is_none());
}

#[test]
fn closing_leaves_recovery_mode() {
    let mut settings = AccountSettings::new();
    settings.open_recovery();
    settings.close();
    assert!(!settings.in_recovery());
    assert!(!settings.is_open());
}
