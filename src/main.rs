//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run
//! the delivery flow. No business logic here; session handling is delegated
//! to SessionService.

use clap::Parser;
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wa_bulk::adapters::browser::{
    GeckoDriverFactory, MockBehavior, MockDriver, WebDriverOptions, WHATSAPP_WEB,
};
use wa_bulk::adapters::persistence::{RunArtifacts, RunLock};
use wa_bulk::adapters::ui::{console, ConsoleProgress};
use wa_bulk::domain::{validator, FormatPolicy, MediaAttachment, Recipient, RunConfig};
use wa_bulk::ports::{ArtifactPort, DriverPort, ProgressPort};
use wa_bulk::shared::cli::{load_raw_recipients, resolve_text_arg, Cli};
use wa_bulk::shared::config::AppConfig;
use wa_bulk::usecases::{ComposerService, DeliveryService, SessionService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    wa_bulk::adapters::ui::init_ui();

    let cli = Cli::parse();
    let cfg = AppConfig::load().unwrap_or_default();

    // Effective settings: CLI flag > environment > default.
    let profile_dir = cli
        .profile_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(cfg.profile_dir_or_default()));
    let login_timeout = Duration::from_secs(
        cli.login_timeout
            .unwrap_or_else(|| cfg.login_timeout_secs_or_default()),
    );
    let send_delay_ms = cli
        .delay
        .map(|secs| (secs * 1000.0).max(0.0) as u64)
        .unwrap_or_else(|| cfg.send_delay_ms_or_default());

    // --- Inputs: recipients, payload ---
    let raw = load_raw_recipients(cli.numbers.as_deref(), cli.numbers_file.as_deref())?;
    if raw.is_empty() {
        anyhow::bail!("no recipients given");
    }
    let policy = FormatPolicy {
        prefix: cfg.number_prefix_or_default(),
        digit_len: cfg.number_digits_or_default(),
    };
    let recipients: Vec<Recipient> = raw
        .iter()
        .map(|input| validator::validate(input, &policy))
        .collect();
    let valid_count = recipients.iter().filter(|r| r.is_valid()).count();

    let run_config = RunConfig {
        message: resolve_text_arg(cli.message.as_deref())?,
        caption: resolve_text_arg(cli.caption.as_deref())?,
        media: cli
            .media
            .as_ref()
            .map(MediaAttachment::from_path)
            .transpose()?,
        policy,
        send_delay_ms,
    };
    if !run_config.has_payload() {
        anyhow::bail!("nothing to send (no message and no file)");
    }

    console::print_preflight(&recipients, &run_config);
    if valid_count > 0 && !cli.yes && !console::confirm_send(valid_count) {
        anyhow::bail!("cancelled");
    }

    // The profile is exclusively owned for the run; dry-run never touches it.
    let _lock = if cli.dry_run {
        None
    } else {
        Some(RunLock::acquire(&profile_dir)?)
    };

    // --- Driver: real Firefox/geckodriver, or the mock for dry runs ---
    let driver: Arc<dyn DriverPort> = if cli.dry_run {
        info!("dry-run: driving the mock browser, nothing will be sent");
        Arc::new(MockDriver::new(MockBehavior::delivering(), WHATSAPP_WEB))
    } else {
        Arc::new(GeckoDriverFactory::new(WebDriverOptions {
            profile_dir: profile_dir.clone(),
            geckodriver_bin: cfg.geckodriver_bin_or_default(),
            webdriver_url: cfg.webdriver_url.clone(),
            port: cfg.webdriver_port_or_default(),
            page_load_timeout_ms: cfg.page_load_timeout_ms_or_default(),
        }))
    };

    // --- Services ---
    let progress: Arc<dyn ProgressPort> = Arc::new(ConsoleProgress::new());
    let session = Arc::new(SessionService::new(
        driver,
        WHATSAPP_WEB,
        Arc::clone(&progress),
        cli.headless,
        login_timeout,
    ));
    let composer = Arc::new(ComposerService::new(
        Arc::clone(&session),
        WHATSAPP_WEB,
        Duration::from_secs(cfg.chat_open_timeout_secs_or_default()),
        Duration::from_secs(cfg.ack_timeout_secs_or_default()),
    ));
    let artifacts = Arc::new(RunArtifacts::create(Path::new(&cfg.runs_dir_or_default()))?);
    let delivery = DeliveryService::new(
        Arc::clone(&session),
        composer,
        Arc::clone(&artifacts) as Arc<dyn ArtifactPort>,
        progress,
    );

    let summary = delivery.run(&recipients, &run_config).await;

    // Release the browser on every path before surfacing run-level failures.
    session.close().await;

    artifacts.finalize(&summary, &run_config).await?;
    console::print_run_summary(&summary, artifacts.dir());

    if valid_count == 0 {
        anyhow::bail!("no valid recipients after validation");
    }
    if !session.ever_authenticated() {
        anyhow::bail!("login was never detected within the timeout; no messages were sent");
    }
    if summary.failed() > 0 {
        warn!(
            failed = summary.failed(),
            "some recipients failed; re-run with --numbers-file on the failed list to retry"
        );
    }
    Ok(())
}
