use super::*;

#[test]
fn exception_names_classify_denials() {
    assert_eq!(DenialReason::from_exception_name("NotAllowedError"), DenialReason::PermissionDenied);
    assert_eq!(DenialReason::from_exception_name("NotSupportedError"), DenialReason::NoArCamera);
    assert_eq!(DenialReason::from_exception_name("SecurityError"), DenialReason::InsecureContext);
    assert_eq!(DenialReason::from_exception_name("InvalidStateError"), DenialReason::DeviceBusy);
    assert_eq!(DenialReason::from_exception_name("TypeError"), DenialReason::Other);
}

#[test]
fn session_error_converts_to_denial() {
    let err: ViewerError = SessionError::new("NotAllowedError", "user dismissed prompt").into();
    match &err {
        ViewerError::ArSessionDenied { reason, detail } => {
            assert_eq!(*reason, DenialReason::PermissionDenied);
            assert!(detail.contains("user dismissed prompt"));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(err.user_message().contains("Camera permission"));
}

#[test]
fn ar_errors_are_not_terminal() {
    assert!(!ViewerError::ArUnsupported.is_terminal());
    assert!(!ViewerError::ArSessionInProgress.is_terminal());
    assert!(!ViewerError::from(SessionError::new("SecurityError", "http")).is_terminal());
}

#[test]
fn load_errors_are_terminal() {
    assert!(ViewerError::DatabaseUnavailable("refused".into()).is_terminal());
    assert!(ViewerError::ModelNotFound { id: "x".into() }.is_terminal());
    assert!(ViewerError::ModelLoadFailed(ImportError::Empty).is_terminal());
    assert!(
        ViewerError::AssetUnreachable { category: UnreachableCategory::NotFound, detail: "HTTP 404".into() }
            .is_terminal()
    );
}

#[test]
fn not_found_message_mentions_server() {
    let err = ViewerError::AssetUnreachable { category: UnreachableCategory::NotFound, detail: "HTTP 404".into() };
    assert_eq!(err.user_message(), "Failed to load 3D model. Model file not found on server.");
}

#[test]
fn other_unreachable_message_carries_detail() {
    let err = ViewerError::AssetUnreachable { category: UnreachableCategory::Other, detail: "HTTP 500".into() };
    assert!(err.user_message().ends_with("HTTP 500"));
}

#[test]
fn timeout_import_message() {
    let err = ViewerError::ModelLoadFailed(ImportError::Timeout(std::time::Duration::from_secs(30)));
    assert!(err.to_string().contains("30s"));
    assert!(err.user_message().contains("too long"));
}

#[test]
fn error_codes_are_distinct() {
    let codes = [
        ViewerError::ArUnsupported.error_code(),
        ViewerError::ArSessionInProgress.error_code(),
        ViewerError::DatabaseUnavailable(String::new()).error_code(),
        ViewerError::ModelNotFound { id: String::new() }.error_code(),
        ViewerError::Config(String::new()).error_code(),
        ViewerError::ModelLoadFailed(ImportError::Empty).error_code(),
    ];
    let unique: std::collections::HashSet<_> = codes.iter().collect();
    assert_eq!(unique.len(), codes.len());
}
