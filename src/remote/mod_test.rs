use super::*;

#[tokio::test]
async fn bounded_passes_through_results() {
    let ok = bounded(Duration::from_secs(1), async { Ok::<_, ServiceError>(7) }).await;
    assert_eq!(ok.unwrap(), 7);

    let err = bounded(Duration::from_secs(1), async { Err::<(), _>(ServiceError::service("boom")) }).await;
    assert_eq!(err.unwrap_err().message, "boom");
}

#[tokio::test]
async fn bounded_maps_expiry_to_timeout() {
    let err = bounded(Duration::from_millis(5), async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<_, ServiceError>(())
    })
    .await
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert!(err.retryable());
}

#[tokio::test]
async fn connect_without_config_degrades_to_unavailable() {
    let svc = connect(Err(ConfigError::Missing { var: "SUPABASE_URL" }));
    let err = svc.get_session().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConfigurationMissing);
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(ServiceError::timeout().error_code(), "E_TIMEOUT");
    assert_eq!(ServiceError::validation("x").error_code(), "E_VALIDATION");
    assert_eq!(ServiceError::configuration_missing().error_code(), "E_CONFIGURATION_MISSING");
    assert!(!ServiceError::validation("x").retryable());
    assert!(!ServiceError::service("x").with_status(400).retryable());
    assert!(ServiceError::service("x").with_status(429).retryable());
}
