use axum::http::StatusCode;
use chitfund_core::OnboardingError;

/// Error half of every handler result.
pub(crate) type ApiError = (StatusCode, &'static str);

/// Maps a core error to a status code and a fixed message, logging the detail.
///
/// - `400` for bad identifiers and submit before the final step
/// - `404` for unknown subscribers
/// - `409` for closed wizards and duplicate subscriber ids
/// - `500` for storage failures
pub(crate) fn api_error(context: &str, err: &OnboardingError) -> ApiError {
    let mapped = match err {
        OnboardingError::InvalidInput(_) | OnboardingError::Text(_) => {
            (StatusCode::BAD_REQUEST, "Invalid input")
        }
        OnboardingError::Id(_) => (StatusCode::BAD_REQUEST, "Invalid identifier"),
        OnboardingError::NotAtFinalStep { .. } => {
            (StatusCode::BAD_REQUEST, "Submit is only available at the final step")
        }
        OnboardingError::SubscriberNotFound(_) => (StatusCode::NOT_FOUND, "Subscriber not found"),
        OnboardingError::WizardClosed => (StatusCode::CONFLICT, "Onboarding session is closed"),
        OnboardingError::DuplicateSubscriber(_) => {
            (StatusCode::CONFLICT, "Subscriber already exists")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    };

    if mapped.0.is_server_error() {
        tracing::error!("{} error: {:?}", context, err);
    } else {
        tracing::warn!("{} rejected: {}", context, err);
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chitfund_core::WizardStep;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            api_error("t", &OnboardingError::WizardClosed).0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            api_error(
                "t",
                &OnboardingError::NotAtFinalStep {
                    current: WizardStep::Membership
                }
            )
            .0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            api_error("t", &OnboardingError::SubscriberNotFound("SUB1".into())).0,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn storage_errors_map_to_500() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            api_error("t", &OnboardingError::FileWrite(io)).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
