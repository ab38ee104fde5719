use std::time::Duration;

use super::*;
use crate::remote::{AUTH_EVENT_CAPACITY, ErrorKind};
use crate::services::auth_flow::FormIntent;
use crate::test_support::{CODE, EMAIL, MockRemote, PASSWORD, session};

fn site() -> SiteConfig {
    SiteConfig {
        site_url: "http://localhost:3000".into(),
        reset_notice: Duration::ZERO,
        call_timeout: Duration::from_secs(5),
    }
}

fn app(mock: &Arc<MockRemote>) -> AppState {
    AppState::new(mock.clone(), site())
}

async fn signed_in(mock: &Arc<MockRemote>) -> AppState {
    let mut app = app(mock);
    mock.establish(AuthEventKind::SignedIn);
    app.drain_auth_events().await;
    assert!(app.is_signed_in());
    app
}

// =============================================================================
// startup
// =============================================================================

#[tokio::test]
async fn bootstrap_without_session_is_logged_out() {
    let mock = MockRemote::new();
    let mut app = app(&mock);
    assert!(app.auth_loading());

    app.bootstrap().await;
    assert!(!app.auth_loading());
    assert!(!app.is_signed_in());
    assert!(app.saved().is_empty());
    assert_eq!(mock.calls(), ["get_session"]);
}

#[tokio::test]
async fn bootstrap_restores_session_and_saved_set() {
    let mock = MockRemote::new();
    let existing = mock.establish(AuthEventKind::SignedIn);
    mock.seed_saved(mock.user_id(), "2");
    let mut app = app(&mock);

    app.bootstrap().await;
    assert_eq!(app.session(), Some(&existing));
    assert!(app.saved().contains("2"));
}

#[tokio::test]
async fn bootstrap_failure_continues_logged_out() {
    let mock = MockRemote::new();
    mock.fail("get_session", ServiceError::service("connection refused"));
    let mut app = app(&mock);

    app.bootstrap().await;
    assert!(!app.auth_loading());
    assert!(!app.is_signed_in());
}

// =============================================================================
// auth events
// =============================================================================

#[tokio::test]
async fn sign_in_event_fetches_saved_and_sign_out_clears() {
    let mock = MockRemote::new();
    mock.seed_saved(mock.user_id(), "6");
    let mut app = signed_in(&mock).await;
    assert!(app.saved().contains("6"));

    mock.sign_out().await;
    assert_eq!(app.drain_auth_events().await, 1);
    assert!(!app.is_signed_in());
    assert!(app.saved().is_empty());
    assert_eq!(app.saved().owner(), None);
}

#[tokio::test]
async fn user_switch_replaces_saved_set() {
    let mock = MockRemote::new();
    mock.seed_saved(mock.user_id(), "2");
    let mut app = signed_in(&mock).await;

    let other = session("other@example.com");
    mock.seed_saved(other.user_id(), "5");
    app.apply_auth_event(AuthEvent::new(AuthEventKind::SignedIn, Some(other.clone()))).await;

    assert_eq!(app.saved().owner(), Some(other.user_id()));
    assert!(app.saved().contains("5"));
    assert!(!app.saved().contains("2"));
}

#[tokio::test]
async fn user_switch_clears_even_when_fetch_fails() {
    let mock = MockRemote::new();
    mock.seed_saved(mock.user_id(), "2");
    let mut app = signed_in(&mock).await;

    mock.fail("select_saved_article_ids", ServiceError::service("timeout"));
    let other = session("other@example.com");
    app.set_session(Some(other)).await;

    assert!(app.saved().is_empty());
}

#[tokio::test]
async fn token_refresh_for_same_user_keeps_saved_set() {
    let mock = MockRemote::new();
    mock.seed_saved(mock.user_id(), "3");
    let mut app = signed_in(&mock).await;

    mock.fail("select_saved_article_ids", ServiceError::service("unavailable"));
    let mut refreshed = app.session().cloned().unwrap();
    refreshed.access_token = "access-rotated".into();
    app.apply_auth_event(AuthEvent::new(AuthEventKind::TokenRefreshed, Some(refreshed.clone()))).await;

    assert_eq!(app.session(), Some(&refreshed));
    assert!(app.saved().contains("3"));
}

#[tokio::test]
async fn password_recovery_opens_settings_in_recovery_mode() {
    let mock = MockRemote::new();
    let mut app = app(&mock);
    mock.establish(AuthEventKind::PasswordRecovery);

    app.drain_auth_events().await;
    assert!(app.is_signed_in());
    assert!(app.account().is_open());
    assert!(app.account().in_recovery());
}

#[tokio::test]
async fn lagged_subscriber_resyncs_from_service() {
    let mock = MockRemote::new();
    let mut app = app(&mock);
    for _ in 0..(AUTH_EVENT_CAPACITY + 4) {
        mock.establish(AuthEventKind::TokenRefreshed);
    }

    app.drain_auth_events().await;
    assert!(mock.calls().contains(&"get_session"));
    assert_eq!(app.session().cloned(), mock.current_session());
}

// =============================================================================
// login through the app
// =============================================================================

#[tokio::test]
async fn password_step_never_signs_the_app_in() {
    let mock = MockRemote::new();
    let mut app = app(&mock);
    app.navigate(View::Login).unwrap();
    let flow = app.auth_flow().cloned().unwrap();
    assert_eq!(flow.snapshot().intent, FormIntent::Login);

    flow.set_email(EMAIL).unwrap();
    flow.set_password(PASSWORD).unwrap();
    assert_eq!(flow.submit().await.unwrap(), FlowOutcome::CodeSent);

    assert_eq!(app.drain_auth_events().await, 2);
    assert!(!app.is_signed_in());
    assert!(!mock.calls().contains(&"select_saved_article_ids"));

    flow.set_code(CODE).unwrap();
    let outcome = flow.submit().await.unwrap();
    app.handle_flow_outcome(&outcome).await;

    assert!(app.is_signed_in());
    assert_eq!(app.view(), &View::Home);
    assert!(app.auth_flow().is_none());
    assert!(!flow.is_mounted());
}

#[tokio::test]
async fn registration_returns_home() {
    let mock = MockRemote::new();
    let mut app = app(&mock);
    app.navigate(View::Register).unwrap();

    app.handle_flow_outcome(&FlowOutcome::Registered).await;
    assert_eq!(app.view(), &View::Home);
    assert!(!app.is_signed_in());
}

#[tokio::test]
async fn failed_outcome_keeps_auth_view() {
    let mock = MockRemote::new();
    let mut app = app(&mock);
    app.navigate(View::Login).unwrap();

    app.handle_flow_outcome(&FlowOutcome::Failed(ErrorKind::InvalidCredentials)).await;
    assert_eq!(app.view(), &View::Login);
    assert!(app.auth_flow().is_some());
}

#[tokio::test]
async fn leaving_auth_view_unmounts_flow() {
    let mock = MockRemote::new();
    let mut app = app(&mock);
    app.navigate(View::Login).unwrap();
    let flow = app.auth_flow().cloned().unwrap();

    app.navigate(View::About).unwrap();
    assert!(!flow.is_mounted());
    assert!(app.auth_flow().is_none());
}

// =============================================================================
// navigation & catalog
// =============================================================================

#[tokio::test]
async fn saved_view_falls_back_to_login() {
    let mock = MockRemote::new();
    let mut app = app(&mock);
    assert_eq!(app.navigate(View::Saved).unwrap(), &View::Login);
    assert!(app.auth_flow().is_some());
}

#[tokio::test]
async fn unknown_article_leaves_view_unchanged() {
    let mock = MockRemote::new();
    let mut app = app(&mock);
    app.navigate(View::About).unwrap();

    assert!(app.navigate(View::Article("42".into())).is_err());
    assert_eq!(app.view(), &View::About);
}

#[tokio::test]
async fn visible_articles_follow_view_and_category() {
    let mock = MockRemote::new();
    mock.seed_saved(mock.user_id(), "6");
    mock.seed_saved(mock.user_id(), "1");
    let mut app = signed_in(&mock).await;

    app.select_category(Category::Education);
    let ids: Vec<_> = app.visible_articles().iter().map(|a| a.id).collect();
    assert_eq!(ids, ["6", "7"]);

    app.navigate(View::Saved).unwrap();
    let ids: Vec<_> = app.visible_articles().iter().map(|a| a.id).collect();
    assert_eq!(ids, ["1", "6"]);
}

// =============================================================================
// saving
// =============================================================================

#[tokio::test]
async fn save_without_session_alerts_and_routes_to_login() {
    let mock = MockRemote::new();
    let mut app = app(&mock);

    assert_eq!(app.toggle_save("1").await, Err(SaveError::LoginRequired));
    assert_eq!(app.view(), &View::Login);
    assert!(app.auth_flow().is_some());
    assert!(app.acknowledge_alert().is_some());
    assert!(app.alert().is_none());
}

#[tokio::test]
async fn save_failure_alerts_and_keeps_set() {
    let mock = MockRemote::new();
    let mut app = signed_in(&mock).await;
    mock.fail("insert_saved_article", ServiceError::service("duplicate key value"));

    assert!(app.toggle_save("4").await.is_err());
    assert!(!app.saved().contains("4"));
    assert_eq!(app.alert(), Some("Could not update saved articles: duplicate key value"));
}

#[tokio::test]
async fn save_round_trip_through_app() {
    let mock = MockRemote::new();
    let mut app = signed_in(&mock).await;

    assert_eq!(app.toggle_save("8").await, Ok(ToggleOutcome::Saved));
    assert_eq!(app.toggle_save("8").await, Ok(ToggleOutcome::Removed));
    assert!(app.saved().is_empty());
    assert!(app.alert().is_none());
}

// =============================================================================
// logout & account
// =============================================================================

#[tokio::test]
async fn logout_clears_state_and_leaves_saved_view() {
    let mock = MockRemote::new();
    mock.seed_saved(mock.user_id(), "2");
    let mut app = signed_in(&mock).await;
    app.navigate(View::Saved).unwrap();

    app.logout().await;
    assert!(!app.is_signed_in());
    assert!(app.saved().is_empty());
    assert_eq!(app.view(), &View::Home);
}

#[tokio::test]
async fn settings_need_a_session() {
    let mock = MockRemote::new();
    let mut app = app(&mock);
    assert!(app.open_settings().is_err());

    mock.establish(AuthEventKind::SignedIn);
    app.drain_auth_events().await;
    app.open_settings().unwrap();
    assert!(app.account().is_open());
    app.close_settings();
    assert!(!app.account().is_open());
}

#[tokio::test]
async fn recovery_password_update_through_app() {
    let mock = MockRemote::new();
    let mut app = app(&mock);
    mock.establish(AuthEventKind::PasswordRecovery);
    app.drain_auth_events().await;

    app.update_password("brand-new-pass").await.unwrap();
    assert!(!app.account().in_recovery());
}

#[tokio::test]
async fn delete_account_signs_out_and_goes_home() {
    let mock = MockRemote::new();
    mock.seed_saved(mock.user_id(), "1");
    let mut app = signed_in(&mock).await;
    app.open_settings().unwrap();

    assert!(app.delete_account(false).await.is_err());
    assert!(app.is_signed_in());

    app.delete_account(true).await.unwrap();
    assert!(!app.is_signed_in());
    assert!(app.saved().is_empty());
    assert_eq!(app.view(), &View::Home);
    assert!(mock.saved_for(mock.user_id()).is_empty());
}
