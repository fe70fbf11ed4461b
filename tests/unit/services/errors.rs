use enrichment_orchestrator::services::errors::{ActivityError, EnrichmentError, ErrorCode, LedgerError, WebhookError};

#[test]
fn insufficient_credits_maps_to_payment_required_code() {
    let err = EnrichmentError::insufficient_credits("not enough credits");
    assert_eq!(err.code, ErrorCode::InsufficientCredits);
}

#[test]
fn ledger_non_positive_amount_becomes_validation_error() {
    let err: EnrichmentError = LedgerError::NonPositiveAmount.into();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[test]
fn ledger_insufficient_credits_becomes_payment_required() {
    let err: EnrichmentError = LedgerError::InsufficientCredits.into();
    assert_eq!(err.code, ErrorCode::InsufficientCredits);
}

#[test]
fn webhook_error_becomes_validation_error() {
    let err: EnrichmentError = WebhookError::NotHttps.into();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[test]
fn only_transient_activity_errors_are_retryable() {
    assert!(ActivityError::Transient("timeout".to_string()).is_retryable());
    assert!(!ActivityError::BreakerOpen("clearbit".to_string()).is_retryable());
    assert!(!ActivityError::UnknownProvider("nope".to_string()).is_retryable());
}
