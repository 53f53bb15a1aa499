//! Run orchestration: validate-filtered recipients in input order, one
//! session check up front, one composer call per recipient, pacing between
//! sends, every recipient accounted for exactly once.
//!
//! Per-recipient failures never abort the run; session-level failures stop
//! the loop and blanket the remaining recipients as `SessionUnavailable`.

use crate::domain::{
    FailureReason, Recipient, RunConfig, RunSummary, SendOutcome, SendResult, SessionState,
};
use crate::ports::{ArtifactPort, ProgressPort};
use crate::usecases::{ComposerService, SessionService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Floor for the pacing delay: sends are never closer than this.
const MIN_SEND_DELAY: Duration = Duration::from_secs(1);

/// Top-level driver of one run.
pub struct DeliveryService {
    session: Arc<SessionService>,
    composer: Arc<ComposerService>,
    artifacts: Arc<dyn ArtifactPort>,
    progress: Arc<dyn ProgressPort>,
}

impl DeliveryService {
    pub fn new(
        session: Arc<SessionService>,
        composer: Arc<ComposerService>,
        artifacts: Arc<dyn ArtifactPort>,
        progress: Arc<dyn ProgressPort>,
    ) -> Self {
        Self {
            session,
            composer,
            artifacts,
            progress,
        }
    }

    /// Process the full recipient list. Infallible by design: whatever
    /// happens, the returned summary accounts for every recipient, and each
    /// result was already flushed to the artifact sink when produced.
    pub async fn run(&self, recipients: &[Recipient], config: &RunConfig) -> RunSummary {
        let mut summary = RunSummary::started();

        // Invalid recipients are recorded immediately and never reach the
        // composer. Input order is preserved across both groups.
        for recipient in recipients.iter().filter(|r| !r.is_valid()) {
            self.record(
                &mut summary,
                SendResult::new(
                    recipient.clone(),
                    SendOutcome::Failed(FailureReason::InvalidFormat),
                ),
            )
            .await;
        }

        let valid: Vec<&Recipient> = recipients.iter().filter(|r| r.is_valid()).collect();
        if valid.is_empty() {
            warn!("no valid recipients after validation");
            summary.finish();
            return summary;
        }

        let ready = match self.session.ensure_ready().await {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, "session setup failed");
                SessionState::Failed
            }
        };
        if ready != SessionState::Authenticated {
            warn!(?ready, "session not authenticated; skipping all sends");
            for recipient in valid {
                self.record(
                    &mut summary,
                    SendResult::new(
                        recipient.clone(),
                        SendOutcome::Failed(FailureReason::SessionUnavailable),
                    ),
                )
                .await;
            }
            summary.finish();
            return summary;
        }

        let total = valid.len();
        let delay = Duration::from_millis(config.send_delay_ms).max(MIN_SEND_DELAY);
        self.progress.batch_started(total);
        info!(total, delay_ms = delay.as_millis() as u64, "run started");

        let mut aborted = false;
        for (idx, recipient) in valid.into_iter().enumerate() {
            if aborted || self.session.state() != SessionState::Authenticated {
                self.record(
                    &mut summary,
                    SendResult::new(
                        recipient.clone(),
                        SendOutcome::Failed(FailureReason::SessionUnavailable),
                    ),
                )
                .await;
                continue;
            }

            self.progress
                .send_started(idx + 1, total, &recipient.normalized);

            let outcome = match self.composer.send(recipient, config).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    // Driver-level fault: stop the loop, keep everything
                    // already collected. This recipient and the rest share
                    // the blanket reason.
                    error!(number = %recipient.normalized, error = %e, "driver failure; aborting run");
                    aborted = true;
                    SendOutcome::Failed(FailureReason::SessionUnavailable)
                }
            };

            self.record(&mut summary, SendResult::new(recipient.clone(), outcome))
                .await;

            // A failed send may mean the session was revoked externally;
            // re-probe so the remainder short-circuits instead of timing out
            // one by one.
            if !aborted && matches!(outcome, SendOutcome::Failed(_)) {
                if let Err(e) = self.session.verify_active().await {
                    warn!(error = %e, "session re-probe failed");
                }
            }

            let last = idx + 1 == total;
            if !aborted && !last {
                tokio::time::sleep(delay).await;
            }
        }

        summary.finish();
        info!(
            total = summary.total(),
            sent = summary.sent(),
            failed = summary.failed(),
            "run finished"
        );
        self.progress.batch_finished(&summary);
        summary
    }

    async fn record(&self, summary: &mut RunSummary, result: SendResult) {
        if let Err(e) = self.artifacts.record(&result).await {
            warn!(error = %e, "failed to flush result to artifacts");
        }
        self.progress.send_finished(&result);
        summary.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::browser::{MockBehavior, MockDriver, WHATSAPP_WEB};
    use crate::adapters::ui::NullProgress;
    use crate::domain::{validator, DomainError, FormatPolicy, MediaAttachment};
    use crate::ports::ProgressPort;
    use std::collections::HashSet;
    use std::time::Duration;

    /// In-memory artifact sink capturing the flush order.
    #[derive(Default)]
    struct MemoryArtifacts {
        recorded: std::sync::Mutex<Vec<SendResult>>,
    }

    #[async_trait::async_trait]
    impl crate::ports::ArtifactPort for MemoryArtifacts {
        async fn record(&self, result: &SendResult) -> Result<(), DomainError> {
            self.recorded.lock().unwrap().push(result.clone());
            Ok(())
        }

        async fn finalize(
            &self,
            _summary: &RunSummary,
            _config: &RunConfig,
        ) -> Result<(), DomainError> {
            Ok(())
        }
    }

    struct Fixture {
        driver: Arc<MockDriver>,
        session: Arc<SessionService>,
        delivery: DeliveryService,
        artifacts: Arc<MemoryArtifacts>,
    }

    fn fixture(behavior: MockBehavior, login_timeout: Duration) -> Fixture {
        let driver = Arc::new(MockDriver::new(behavior, WHATSAPP_WEB));
        let progress: Arc<dyn ProgressPort> = Arc::new(NullProgress);
        let session = Arc::new(SessionService::new(
            Arc::clone(&driver) as Arc<dyn crate::ports::DriverPort>,
            WHATSAPP_WEB,
            Arc::clone(&progress),
            false,
            login_timeout,
        ));
        let composer = Arc::new(ComposerService::new(
            Arc::clone(&session),
            WHATSAPP_WEB,
            Duration::ZERO,
            Duration::ZERO,
        ));
        let artifacts = Arc::new(MemoryArtifacts::default());
        let delivery = DeliveryService::new(
            Arc::clone(&session),
            composer,
            Arc::clone(&artifacts) as Arc<dyn crate::ports::ArtifactPort>,
            progress,
        );
        Fixture {
            driver,
            session,
            delivery,
            artifacts,
        }
    }

    fn recipients(inputs: &[&str]) -> Vec<Recipient> {
        let policy = FormatPolicy::default();
        inputs
            .iter()
            .map(|i| validator::validate(i, &policy))
            .collect()
    }

    fn text_config() -> RunConfig {
        RunConfig {
            message: Some("hello".into()),
            caption: None,
            media: None,
            policy: FormatPolicy::default(),
            send_delay_ms: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn every_recipient_accounted_exactly_once() {
        let f = fixture(MockBehavior::delivering(), Duration::from_secs(5));
        let list = recipients(&["966500000001", "123", "966500000002"]);

        let summary = f.delivery.run(&list, &text_config()).await;

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.sent() + summary.failed(), 3);
        assert_eq!(summary.sent(), 2);
        let invalid = &summary.results[0];
        assert_eq!(
            invalid.failure_reason(),
            Some(FailureReason::InvalidFormat)
        );
        assert_eq!(invalid.recipient.reported(), "123");
        // Flush order matches summary order.
        let flushed = f.artifacts.recorded.lock().unwrap();
        assert_eq!(flushed.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_recipient_never_reaches_the_composer() {
        let f = fixture(MockBehavior::delivering(), Duration::from_secs(5));
        let list = recipients(&["123"]);

        let summary = f.delivery.run(&list, &text_config()).await;

        assert_eq!(summary.total(), 1);
        assert_eq!(
            summary.results[0].failure_reason(),
            Some(FailureReason::InvalidFormat)
        );
        // No session, no navigation, no UI interaction.
        assert_eq!(f.driver.navigations(), 0);
        assert_eq!(f.driver.ui_actions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn login_timeout_blankets_all_valid_recipients() {
        let behavior = MockBehavior {
            authenticated: false,
            ..MockBehavior::default()
        };
        let f = fixture(behavior, Duration::ZERO);
        let list = recipients(&["966500000001", "966500000002"]);

        let summary = f.delivery.run(&list, &text_config()).await;

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.sent(), 0);
        for result in &summary.results {
            assert_eq!(
                result.failure_reason(),
                Some(FailureReason::SessionUnavailable)
            );
        }
        assert!(!f.session.ever_authenticated());
        assert_eq!(f.driver.ui_actions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_number_is_local_to_that_recipient() {
        let behavior = MockBehavior {
            unreachable: HashSet::from(["966500000001".to_string()]),
            ..MockBehavior::delivering()
        };
        let f = fixture(behavior, Duration::from_secs(5));
        let list = recipients(&["966500000001", "966500000002"]);

        let summary = f.delivery.run(&list, &text_config()).await;

        assert_eq!(
            summary.results[0].failure_reason(),
            Some(FailureReason::RecipientUnreachable)
        );
        assert!(summary.results[1].is_sent());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_media_fails_without_ui_interaction() {
        let f = fixture(MockBehavior::delivering(), Duration::from_secs(5));
        let list = recipients(&["966500000001"]);
        let config = RunConfig {
            message: None,
            caption: Some("cap".into()),
            media: Some(MediaAttachment {
                path: "/no/such/file.mp4".into(),
                kind: crate::domain::MediaKind::Video,
            }),
            policy: FormatPolicy::default(),
            send_delay_ms: 0,
        };

        let summary = f.delivery.run(&list, &config).await;

        assert_eq!(
            summary.results[0].failure_reason(),
            Some(FailureReason::MediaInvalid)
        );
        // Only the login navigation happened; the send touched nothing.
        assert_eq!(f.driver.navigations(), 1);
        assert_eq!(f.driver.ui_actions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn mid_run_expiry_short_circuits_the_remainder() {
        let behavior = MockBehavior {
            authenticated: true,
            confirm_delivery: true,
            logout_after_sends: Some(1),
            ..MockBehavior::default()
        };
        let f = fixture(behavior, Duration::from_secs(5));
        let list = recipients(&["966500000001", "966500000002", "966500000003"]);

        let summary = f.delivery.run(&list, &text_config()).await;

        // The submit that triggered the revocation gets no ack; everyone
        // after is short-circuited without an attempt.
        assert_eq!(
            summary.results[0].failure_reason(),
            Some(FailureReason::DeliveryUnconfirmed)
        );
        assert_eq!(
            summary.results[1].failure_reason(),
            Some(FailureReason::SessionUnavailable)
        );
        assert_eq!(
            summary.results[2].failure_reason(),
            Some(FailureReason::SessionUnavailable)
        );
        assert_eq!(f.session.state(), crate::domain::SessionState::Expired);
        assert!(f.session.ever_authenticated());
    }
}
