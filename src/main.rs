use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use city_energy_live::api::ApiClient;
use city_energy_live::config::Config;
use city_energy_live::history::fetch_hourly;
use city_energy_live::live::view::{run_fleet_view, TOTAL_VIEW, TREND_VIEW};
use city_energy_live::live::{FeedHandle, SelectionStore, WindowView};
use city_energy_live::mqtt::MqttPublisher;
use city_energy_live::render::{LiveSink, LogSink};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long startup waits for the broker's ConnAck
const MQTT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// City Energy Live - Publishes rolling sensor-network energy metrics
#[derive(Parser)]
#[command(name = "city-energy-live")]
#[command(version)]
#[command(about = "City Energy Live - Publishes rolling sensor-network energy metrics", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the sensor API and publish live windows (default)
    Live,
    /// Print the server's hourly aggregates for a day as JSON
    Hourly {
        /// Day to query (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration first (to get log level)
    let config_path = cli.config;
    let config = Config::from_file(&config_path)?;

    // Initialize tracing with log level from config
    let app_log_level = config.default.log_level.as_str();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("city_energy_live={}", app_log_level).parse()?)
                .add_directive("rumqttc=warn".parse()?)
                .add_directive("reqwest=warn".parse()?)
                .add_directive("hyper=warn".parse()?),
        )
        .init();

    info!("Configuration loaded from: {}", config_path);
    info!("Log level: {}", config.default.log_level);
    debug!("Debug logging is enabled");

    let client = ApiClient::new(config.api.base_url.trim(), config.api.timeout)?;
    info!("  API: {}", client.base_url());

    match cli.command.unwrap_or(Command::Live) {
        Command::Live => run_live(&config, client).await,
        Command::Hourly { date } => {
            let today = Local::now().date_naive();
            let report = fetch_hourly(&client, date.unwrap_or(today), today).await?;
            info!(
                "{}: {:.2}kWh (solar {:.2}kWh, grid {:.2}kWh) from {} readings",
                report.date,
                report.totals.total_kwh,
                report.totals.solar_kwh,
                report.totals.grid_kwh,
                report.totals.reading_count
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn run_live(config: &Config, client: ApiClient) -> anyhow::Result<()> {
    let live = &config.live;
    info!("  Total window: {} points", live.total_capacity);
    info!("  Trend window: {} points", live.trend_capacity);
    info!("  Interval: {:?}", live.interval);
    info!("  Fleet Interval: {:?}", live.fleet_interval);

    let publisher = match &config.mqtt {
        Some(mqtt) => {
            info!("Creating MQTT publisher...");
            let publisher = MqttPublisher::new(mqtt)?;
            info!("✓ MQTT publisher created successfully!");

            if publisher.wait_connected(MQTT_CONNECT_TIMEOUT).await {
                info!("✓ MQTT broker acknowledged connection");
            } else {
                warn!(
                    "MQTT broker not reachable after {:?}, publishing continues in the background",
                    MQTT_CONNECT_TIMEOUT
                );
            }

            if let Err(e) = publisher.publish_online_status(true) {
                warn!("Failed to publish online status: {}", e);
            } else {
                info!("✓ Published online status");
            }
            Some(publisher)
        }
        None => {
            warn!("No [mqtt] section configured, rendering to log only");
            None
        }
    };
    let log_sink = LogSink;
    let sink: &dyn LiveSink = match &publisher {
        Some(publisher) => publisher,
        None => &log_sink,
    };

    let shutdown = CancellationToken::new();
    let handler_token = shutdown.clone();
    ctrlc::set_handler(move || {
        handler_token.cancel();
    })?;

    let selection = SelectionStore::new(config.selection.to_selection());
    let source = Arc::new(client);

    let total_feed = FeedHandle::spawn(TOTAL_VIEW, source.clone(), live.interval, &shutdown);
    let trend_feed = FeedHandle::spawn(TREND_VIEW, source.clone(), live.interval, &shutdown);
    let fleet_feed = FeedHandle::spawn("fleet", source, live.fleet_interval, &shutdown);

    let mut total_view = WindowView::new(TOTAL_VIEW, live.total_capacity);
    let mut trend_view = WindowView::new(TREND_VIEW, live.trend_capacity);

    info!("Starting live views...");
    tokio::join!(
        total_view.run(total_feed, sink),
        trend_view.run(trend_feed, sink),
        run_fleet_view(fleet_feed, selection, sink),
    );

    info!("Shutting down");
    if let Some(publisher) = &publisher {
        if let Err(e) = publisher.publish_online_status(false) {
            warn!("Failed to publish offline status: {}", e);
        } else if publisher.is_connected() {
            info!("✓ Published offline status");
            // Let the event loop flush the queued message
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
    Ok(())
}
