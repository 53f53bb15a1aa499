//! Implements ArtifactPort. One fresh artifact set per run under a
//! timestamped directory.
//!
//! Result lists are appended as results arrive so a crash mid-run loses
//! nothing; summary and config use the write-replace pattern (temp file,
//! sync, atomic rename).

use crate::domain::{DomainError, FormatPolicy, MediaAttachment, RunConfig, RunSummary, SendResult};
use crate::ports::ArtifactPort;
use chrono::{Local, SecondsFormat};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

const SENT_FILE: &str = "sent_numbers.txt";
const FAILED_FILE: &str = "failed.txt";
const SUMMARY_FILE: &str = "summary.txt";
const CONFIG_FILE: &str = "config.json";

/// Audit view of the effective configuration. Message bodies are previewed,
/// not dumped: artifacts may be archived more widely than the content.
#[derive(Serialize)]
struct ConfigAudit<'a> {
    message_preview: Option<String>,
    caption_preview: Option<String>,
    media: Option<&'a MediaAttachment>,
    policy: &'a FormatPolicy,
    send_delay_ms: u64,
}

fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}

/// Run-scoped artifact directory.
pub struct RunArtifacts {
    run_dir: PathBuf,
}

impl RunArtifacts {
    /// Create `runs_root/<timestamp>/` with the empty result lists, so every
    /// run leaves a uniform artifact set even when nothing is sent.
    pub fn create(runs_root: &Path) -> Result<Self, DomainError> {
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let run_dir = runs_root.join(stamp);
        std::fs::create_dir_all(&run_dir)
            .map_err(|e| DomainError::Artifact(format!("create run dir: {e}")))?;
        for name in [SENT_FILE, FAILED_FILE] {
            std::fs::File::create(run_dir.join(name))
                .map_err(|e| DomainError::Artifact(format!("create {name}: {e}")))?;
        }
        info!(dir = %run_dir.display(), "run artifacts directory created");
        Ok(Self { run_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.run_dir
    }

    async fn append_line(&self, name: &str, line: &str) -> Result<(), DomainError> {
        let path = self.run_dir.join(name);
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| DomainError::Artifact(format!("open {name}: {e}")))?;
        f.write_all(line.as_bytes())
            .await
            .map_err(|e| DomainError::Artifact(format!("write {name}: {e}")))?;
        f.write_all(b"\n")
            .await
            .map_err(|e| DomainError::Artifact(format!("write {name}: {e}")))?;
        f.flush()
            .await
            .map_err(|e| DomainError::Artifact(format!("flush {name}: {e}")))?;
        Ok(())
    }

    /// Write to a temp file, sync, then rename over the target.
    async fn write_atomic(&self, name: &str, contents: &str) -> Result<(), DomainError> {
        let path = self.run_dir.join(name);
        let temp = path.with_extension("tmp");
        let mut f = fs::File::create(&temp)
            .await
            .map_err(|e| DomainError::Artifact(format!("create temp {name}: {e}")))?;
        f.write_all(contents.as_bytes())
            .await
            .map_err(|e| DomainError::Artifact(format!("write temp {name}: {e}")))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::Artifact(format!("sync temp {name}: {e}")))?;
        drop(f);
        fs::rename(&temp, &path)
            .await
            .map_err(|e| DomainError::Artifact(format!("rename {name}: {e}")))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ArtifactPort for RunArtifacts {
    async fn record(&self, result: &SendResult) -> Result<(), DomainError> {
        match result.failure_reason() {
            None => {
                self.append_line(SENT_FILE, result.recipient.reported())
                    .await
            }
            Some(reason) => {
                let line = format!("{}\t{}", result.recipient.reported(), reason);
                self.append_line(FAILED_FILE, &line).await
            }
        }
    }

    async fn finalize(
        &self,
        summary: &RunSummary,
        config: &RunConfig,
    ) -> Result<(), DomainError> {
        let finished = summary
            .finished_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "-".to_string());
        let text = format!(
            "Started:  {}\nFinished: {}\nTotal:    {}\nSent:     {}\nFailed:   {}\n",
            summary
                .started_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            finished,
            summary.total(),
            summary.sent(),
            summary.failed(),
        );
        self.write_atomic(SUMMARY_FILE, &text).await?;

        let audit = ConfigAudit {
            message_preview: config.message.as_deref().map(preview),
            caption_preview: config.caption.as_deref().map(preview),
            media: config.media.as_ref(),
            policy: &config.policy,
            send_delay_ms: config.send_delay_ms,
        };
        let json = serde_json::to_string_pretty(&audit)
            .map_err(|e| DomainError::Artifact(e.to_string()))?;
        self.write_atomic(CONFIG_FILE, &json).await?;

        info!(dir = %self.run_dir.display(), "run artifacts saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FailureReason, Recipient, SendOutcome};

    fn recipient(number: &str) -> Recipient {
        Recipient {
            raw: number.to_string(),
            normalized: number.to_string(),
            rejection: None,
        }
    }

    fn config() -> RunConfig {
        RunConfig {
            message: Some("hello world, this is a rather long message".into()),
            caption: None,
            media: None,
            policy: FormatPolicy::default(),
            send_delay_ms: 3000,
        }
    }

    #[tokio::test]
    async fn records_preserve_input_order_and_split_by_outcome() {
        let root = tempfile::tempdir().unwrap();
        let artifacts = RunArtifacts::create(root.path()).unwrap();

        let results = [
            SendResult::new(recipient("966500000001"), SendOutcome::Sent),
            SendResult::new(
                recipient("966500000002"),
                SendOutcome::Failed(FailureReason::DeliveryUnconfirmed),
            ),
            SendResult::new(recipient("966500000003"), SendOutcome::Sent),
        ];
        for r in &results {
            artifacts.record(r).await.unwrap();
        }

        let sent = std::fs::read_to_string(artifacts.dir().join("sent_numbers.txt")).unwrap();
        assert_eq!(sent, "966500000001\n966500000003\n");
        let failed = std::fs::read_to_string(artifacts.dir().join("failed.txt")).unwrap();
        assert_eq!(failed, "966500000002\tdelivery unconfirmed\n");
    }

    #[tokio::test]
    async fn finalize_writes_summary_and_config_audit() {
        let root = tempfile::tempdir().unwrap();
        let artifacts = RunArtifacts::create(root.path()).unwrap();

        let mut summary = RunSummary::started();
        summary.push(SendResult::new(recipient("966500000001"), SendOutcome::Sent));
        summary.finish();

        artifacts.finalize(&summary, &config()).await.unwrap();

        let text = std::fs::read_to_string(artifacts.dir().join("summary.txt")).unwrap();
        assert!(text.contains("Total:    1"));
        assert!(text.contains("Sent:     1"));
        assert!(text.contains("Failed:   0"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(artifacts.dir().join("config.json")).unwrap())
                .unwrap();
        assert_eq!(json["policy"]["prefix"], "966");
        assert_eq!(json["send_delay_ms"], 3000);
        assert!(json["message_preview"].as_str().unwrap().starts_with("hello world"));
    }

    #[tokio::test]
    async fn empty_result_lists_exist_from_the_start() {
        let root = tempfile::tempdir().unwrap();
        let artifacts = RunArtifacts::create(root.path()).unwrap();
        assert!(artifacts.dir().join("sent_numbers.txt").exists());
        assert!(artifacts.dir().join("failed.txt").exists());
    }
}
