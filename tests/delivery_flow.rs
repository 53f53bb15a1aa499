//! End-to-end runs against the mock browser: validation, session handling,
//! orchestration, and the on-disk artifact set.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wa_bulk::adapters::browser::{MockBehavior, MockDriver, WHATSAPP_WEB};
use wa_bulk::adapters::persistence::RunArtifacts;
use wa_bulk::adapters::ui::NullProgress;
use wa_bulk::domain::{
    validator, FormatPolicy, MediaAttachment, Recipient, RunConfig, RunSummary, MAX_MEDIA_BYTES,
};
use wa_bulk::ports::{ArtifactPort, DriverPort, ProgressPort};
use wa_bulk::usecases::{ComposerService, DeliveryService, SessionService};

struct Harness {
    driver: Arc<MockDriver>,
    session: Arc<SessionService>,
    artifacts: Arc<RunArtifacts>,
    delivery: DeliveryService,
}

fn harness(behavior: MockBehavior, runs_root: &Path, login_timeout: Duration) -> Harness {
    let driver = Arc::new(MockDriver::new(behavior, WHATSAPP_WEB));
    let progress: Arc<dyn ProgressPort> = Arc::new(NullProgress);
    let session = Arc::new(SessionService::new(
        Arc::clone(&driver) as Arc<dyn DriverPort>,
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
    let artifacts = Arc::new(RunArtifacts::create(runs_root).unwrap());
    let delivery = DeliveryService::new(
        Arc::clone(&session),
        composer,
        Arc::clone(&artifacts) as Arc<dyn ArtifactPort>,
        progress,
    );
    Harness {
        driver,
        session,
        artifacts,
        delivery,
    }
}

fn recipients(inputs: &[&str]) -> Vec<Recipient> {
    let policy = FormatPolicy::default();
    inputs
        .iter()
        .map(|i| validator::validate(i, &policy))
        .collect()
}

fn text_config(message: &str) -> RunConfig {
    RunConfig {
        message: Some(message.to_string()),
        caption: None,
        media: None,
        policy: FormatPolicy::default(),
        send_delay_ms: 0,
    }
}

async fn finalize(h: &Harness, summary: &RunSummary, config: &RunConfig) {
    h.artifacts.finalize(summary, config).await.unwrap();
}

fn read(h: &Harness, name: &str) -> String {
    std::fs::read_to_string(h.artifacts.dir().join(name)).unwrap()
}

#[tokio::test(start_paused = true)]
async fn happy_path_writes_the_full_artifact_set() {
    let root = tempfile::tempdir().unwrap();
    let h = harness(MockBehavior::delivering(), root.path(), Duration::from_secs(45));
    let list = recipients(&["966500000001", "966500000002"]);
    let config = text_config("hello\nمرحبا");

    let summary = h.delivery.run(&list, &config).await;
    finalize(&h, &summary, &config).await;

    assert_eq!(summary.sent(), 2);
    assert_eq!(read(&h, "sent_numbers.txt"), "966500000001\n966500000002\n");
    assert_eq!(read(&h, "failed.txt"), "");

    let summary_txt = read(&h, "summary.txt");
    assert!(summary_txt.contains("Total:    2"));
    assert!(summary_txt.contains("Sent:     2"));
    assert!(summary_txt.contains("Failed:   0"));

    let config_json: serde_json::Value = serde_json::from_str(&read(&h, "config.json")).unwrap();
    assert_eq!(config_json["policy"]["digit_len"], 12);
    assert!(config_json["message_preview"]
        .as_str()
        .unwrap()
        .contains("hello"));
}

#[tokio::test(start_paused = true)]
async fn mixed_validity_attempts_only_the_valid_recipient() {
    let root = tempfile::tempdir().unwrap();
    let h = harness(MockBehavior::delivering(), root.path(), Duration::from_secs(45));
    let list = recipients(&["966500000001", "123"]);
    let config = text_config("hi");

    let summary = h.delivery.run(&list, &config).await;
    finalize(&h, &summary, &config).await;

    assert_eq!(summary.sent(), 1);
    assert_eq!(summary.failed(), 1);
    assert_eq!(read(&h, "sent_numbers.txt"), "966500000001\n");
    assert_eq!(read(&h, "failed.txt"), "123\tinvalid format\n");
}

#[tokio::test(start_paused = true)]
async fn failed_login_still_writes_artifacts_for_everyone() {
    let root = tempfile::tempdir().unwrap();
    let behavior = MockBehavior {
        authenticated: false,
        ..MockBehavior::default()
    };
    let h = harness(behavior, root.path(), Duration::ZERO);
    let list = recipients(&["966500000001", "966500000002"]);
    let config = text_config("hi");

    let summary = h.delivery.run(&list, &config).await;
    finalize(&h, &summary, &config).await;

    assert!(!h.session.ever_authenticated());
    assert_eq!(summary.sent(), 0);
    assert_eq!(
        read(&h, "failed.txt"),
        "966500000001\tsession unavailable\n966500000002\tsession unavailable\n"
    );
    assert!(read(&h, "summary.txt").contains("Failed:   2"));
}

#[tokio::test(start_paused = true)]
async fn media_at_the_size_limit_is_accepted_one_byte_over_is_not() {
    let root = tempfile::tempdir().unwrap();
    let media_dir = tempfile::tempdir().unwrap();

    for (name, size, expect_sent) in [
        ("exact.mp4", MAX_MEDIA_BYTES, true),
        ("over.mp4", MAX_MEDIA_BYTES + 1, false),
    ] {
        let path = media_dir.path().join(name);
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(size).unwrap();

        let h = harness(MockBehavior::delivering(), root.path(), Duration::from_secs(45));
        let config = RunConfig {
            message: None,
            caption: Some("caption line\nثاني".into()),
            media: Some(MediaAttachment::from_path(&path).unwrap()),
            policy: FormatPolicy::default(),
            send_delay_ms: 0,
        };
        let summary = h.delivery.run(&recipients(&["966500000001"]), &config).await;

        if expect_sent {
            assert_eq!(summary.sent(), 1, "file of exactly the limit must pass");
            assert!(h.driver.ui_actions() > 0);
        } else {
            assert_eq!(summary.sent(), 0, "one byte over the limit must fail");
            assert_eq!(
                summary.results[0].failure_reason(),
                Some(wa_bulk::domain::FailureReason::MediaInvalid)
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn unreachable_recipients_are_reported_with_their_reason() {
    let root = tempfile::tempdir().unwrap();
    let behavior = MockBehavior {
        unreachable: HashSet::from(["966500000002".to_string()]),
        ..MockBehavior::delivering()
    };
    let h = harness(behavior, root.path(), Duration::from_secs(45));
    let config = text_config("hi");

    let summary = h
        .delivery
        .run(&recipients(&["966500000001", "966500000002"]), &config)
        .await;
    finalize(&h, &summary, &config).await;

    assert_eq!(read(&h, "sent_numbers.txt"), "966500000001\n");
    assert_eq!(
        read(&h, "failed.txt"),
        "966500000002\trecipient unreachable\n"
    );
}
