use std::sync::Arc;

use super::{DirectoryError, DirectoryService, RepIdentity};
use crate::activity::{log_best_effort, ActivityEntry, ActivityEventType, ActivityLog, ActivityStatus, ClientContext};

/// Rep sign-in by access link or shared PIN, with every attempt logged.
///
/// This is a gate against casual access, not an authorization system.
pub struct RepAuthenticator {
    directory: Arc<DirectoryService>,
    activity: Arc<dyn ActivityLog>,
}

impl RepAuthenticator {
    pub fn new(directory: Arc<DirectoryService>, activity: Arc<dyn ActivityLog>) -> Self {
        Self { directory, activity }
    }

    /// Entry point for a new session. With an access link identifier the rep
    /// is signed in directly; without one the PIN screen is shown (`Ok(None)`).
    pub async fn open_session(
        &self,
        context: &ClientContext,
        url_id: Option<&str>,
    ) -> Result<Option<RepIdentity>, DirectoryError> {
        let Some(url_id) = url_id.map(str::trim).filter(|id| !id.is_empty()) else {
            log_best_effort(
                self.activity.as_ref(),
                ActivityEntry::new(context, ActivityEventType::AuthScreen, ActivityStatus::Info)
                    .details("PIN screen shown"),
            )
            .await;
            return Ok(None);
        };

        let directory = self.directory.snapshot().await;
        match directory.resolve_identifier(url_id) {
            Some(identity) => {
                tracing::info!(rep = %identity.name, "Rep signed in by access link");
                log_best_effort(
                    self.activity.as_ref(),
                    ActivityEntry::new(context, ActivityEventType::LoginSuccess, ActivityStatus::Success)
                        .rep(&identity.name)
                        .details("Signed in by access link"),
                )
                .await;
                Ok(Some(identity))
            }
            None => {
                tracing::warn!(url_id, client = %context.client_identity, "Unrecognized access link");
                log_best_effort(
                    self.activity.as_ref(),
                    ActivityEntry::new(context, ActivityEventType::SuspiciousAccess, ActivityStatus::Failure)
                        .details(format!("Unknown access identifier: {url_id}")),
                )
                .await;
                Err(DirectoryError::UnknownIdentifier)
            }
        }
    }

    pub async fn login_with_pin(
        &self,
        context: &ClientContext,
        rep: &str,
        pin: &str,
    ) -> Result<RepIdentity, DirectoryError> {
        let directory = self.directory.snapshot().await;

        match directory.authenticate_pin(rep, pin) {
            Ok(identity) => {
                tracing::info!(rep = %identity.name, "Rep signed in by PIN");
                log_best_effort(
                    self.activity.as_ref(),
                    ActivityEntry::new(context, ActivityEventType::LoginSuccess, ActivityStatus::Success)
                        .rep(&identity.name)
                        .details("Signed in by PIN"),
                )
                .await;
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!(rep, error = %e, "PIN sign-in rejected");
                log_best_effort(
                    self.activity.as_ref(),
                    ActivityEntry::new(context, ActivityEventType::PinAttempt, ActivityStatus::Failure)
                        .rep(rep.trim())
                        .details(e.to_string()),
                )
                .await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::InMemoryActivityLog;
    use crate::directory::fixtures::{CUSTOMERS_CSV, REPS_CSV};
    use crate::lookup::InlineSource;
    use std::time::Duration;

    fn setup() -> (RepAuthenticator, Arc<InMemoryActivityLog>) {
        let directory = Arc::new(DirectoryService::new(
            Arc::new(InlineSource::new("SalesReps", REPS_CSV)),
            Arc::new(InlineSource::new("Customers", CUSTOMERS_CSV)),
            Duration::from_secs(300),
        ));
        let log = Arc::new(InMemoryActivityLog::new());
        (RepAuthenticator::new(directory, log.clone()), log)
    }

    fn context() -> ClientContext {
        ClientContext::new("10.0.0.7", "Safari/iPad")
    }

    #[tokio::test]
    async fn test_access_link_signs_in() {
        let (auth, log) = setup();
        let identity = auth.open_session(&context(), Some("dana-7f3a")).await.unwrap();
        assert_eq!(identity.unwrap().name, "Dana");

        let entries = log.entries().await;
        assert_eq!(entries[0].event_type, ActivityEventType::LoginSuccess);
        assert_eq!(entries[0].rep_name, "Dana");
    }

    #[tokio::test]
    async fn test_unknown_link_is_suspicious() {
        let (auth, log) = setup();
        let result = auth.open_session(&context(), Some("guess-123")).await;
        assert!(matches!(result, Err(DirectoryError::UnknownIdentifier)));

        let entries = log.entries().await;
        assert_eq!(entries[0].event_type, ActivityEventType::SuspiciousAccess);
        assert_eq!(entries[0].status, ActivityStatus::Failure);
    }

    #[tokio::test]
    async fn test_no_link_shows_pin_screen() {
        let (auth, log) = setup();
        assert!(auth.open_session(&context(), None).await.unwrap().is_none());
        assert_eq!(log.entries().await[0].event_type, ActivityEventType::AuthScreen);
    }

    #[tokio::test]
    async fn test_pin_attempts_are_logged() {
        let (auth, log) = setup();
        let ctx = context();

        assert!(auth.login_with_pin(&ctx, "Dana", "1234").await.is_err());
        assert!(auth.login_with_pin(&ctx, "Dana", "4821").await.is_ok());

        let events: Vec<_> = log
            .entries()
            .await
            .iter()
            .map(|entry| (entry.event_type, entry.status))
            .collect();
        assert_eq!(
            events,
            vec![
                (ActivityEventType::PinAttempt, ActivityStatus::Failure),
                (ActivityEventType::LoginSuccess, ActivityStatus::Success),
            ]
        );
    }
}
