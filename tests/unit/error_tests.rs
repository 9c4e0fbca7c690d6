// Error module unit tests

use point_gateway::error::GatewayError;
use point_gateway::store::StoreError;

#[test]
fn test_every_variant_has_a_distinct_code() {
    let errors = vec![
        GatewayError::NoBackendsAvailable,
        GatewayError::StoreUnavailable("down".into()),
        GatewayError::InvalidSession("missing".into()),
        GatewayError::backend_unreachable("rh-1", "refused"),
        GatewayError::AffinityWriteFailed("x".into()),
        GatewayError::RegistrationFailed("x".into()),
        GatewayError::InvalidCommand("x".into()),
        GatewayError::Bridge("x".into()),
        GatewayError::Config("x".into()),
        GatewayError::Internal("x".into()),
    ];

    let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}

#[test]
fn test_backend_unreachable_has_no_status() {
    match GatewayError::backend_unreachable("http://rh-1:9000", "connection refused") {
        GatewayError::BackendError {
            backend,
            status,
            detail,
        } => {
            assert_eq!(backend, "http://rh-1:9000");
            assert_eq!(status, None);
            assert_eq!(detail, "connection refused");
        }
        other => panic!("unexpected variant {:?}", other),
    }
}

#[test]
fn test_store_errors_convert() {
    let err: GatewayError = StoreError::ConnectionFailed("no route".into()).into();
    assert_eq!(err.code(), "StoreUnavailable");
    assert!(err.to_string().contains("no route"));
}

#[test]
fn test_errors_are_std_errors() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
    assert_error::<GatewayError>();
    assert_error::<StoreError>();
}
