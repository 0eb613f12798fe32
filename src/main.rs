/// Service entry point.
///
/// Wires the live telemetry feed, the PostgreSQL stores, and the
/// notification transports into an alert monitor covering every registered
/// device, then blocks draining the feed-fault channel. Configuration comes
/// from `wwmon.toml` next to the binary; secrets come from the environment
/// (`.env` supported via dotenv).

use std::path::Path;
use std::sync::Arc;

use postgres::{Client, NoTls};

use wwmon_service::alert::monitor::{AlertMonitor, MonitorConfig};
use wwmon_service::config::Config;
use wwmon_service::feed::http::HttpFeed;
use wwmon_service::logging::{self, LogLevel, LogSource};
use wwmon_service::notify::email::SmtpRelayTransport;
use wwmon_service::notify::push::HttpPushTransport;
use wwmon_service::notify::AlertDispatcher;
use wwmon_service::store::postgres::{PgAlertStore, PgDirectory};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::load(Path::new("./wwmon.toml"))?;

    logging::init_logger(LogLevel::Info, Some("./wwmon.log"), true);
    logging::info(LogSource::System, None, "Wastewater monitoring service starting");

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL is not set (see .env.example)")?;
    let alert_client = Client::connect(&database_url, NoTls)?;
    let directory_client = Client::connect(&database_url, NoTls)?;

    let store = Arc::new(PgAlertStore::new(alert_client));
    let directory = Arc::new(PgDirectory::new(directory_client));

    let feed = Arc::new(HttpFeed::new(
        &config.feed.base_url,
        config.feed.poll_interval(),
    )?);

    let push = Arc::new(HttpPushTransport::new(&config.push.endpoint)?);
    // Missing relay credentials put the email transport in dry-run mode.
    let email_api_key = std::env::var("EMAIL_API_KEY").ok();
    if email_api_key.is_none() {
        logging::warn(
            LogSource::Email,
            None,
            "EMAIL_API_KEY not set, email notifications run in dry-run mode",
        );
    }
    let email = Arc::new(SmtpRelayTransport::new(
        &config.email.endpoint,
        &config.email.from,
        email_api_key,
    )?);

    let dispatcher = Arc::new(AlertDispatcher::new(directory, push, email));

    let (monitor, fault_rx) = AlertMonitor::new(
        feed,
        store,
        dispatcher,
        MonitorConfig {
            cooldown_secs: config.monitor.cooldown_secs,
            stale_after_minutes: config.monitor.stale_after_minutes,
        },
    );

    let started = monitor.start_all();
    if started == 0 {
        return Err("No monitoring sessions could be started".into());
    }

    // Workers log and recover from feed trouble on their own; the main
    // thread just keeps a visible record of each fault.
    for fault in fault_rx {
        logging::warn(
            LogSource::Feed,
            Some(&fault.device_id),
            &format!("Feed fault observed: {}", fault.error),
        );
    }

    logging::info(LogSource::System, None, "All monitoring sessions ended, shutting down");
    Ok(())
}
