//! Main entry point for the order tracker service.
//!
//! This binary wires the configured store, carrier, and notification
//! implementations into a [`TrackerEngine`], resumes tracking sessions
//! for every order that is already out for delivery, and runs until
//! interrupted.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracker_config::Config;
use tracker_core::TrackerEngine;

// Import implementations from individual crates
use tracker_carrier::implementations::http::HttpCarrier;
use tracker_carrier::{CarrierInterface, CarrierService};
use tracker_notify::implementations::channel::ChannelNotifier;
use tracker_notify::{NotificationInterface, NotificationService};
use tracker_store::implementations::memory::MemoryStore;
use tracker_store::{OrderStoreInterface, StoreService};
use tracker_types::OrderFilter;

/// Command-line arguments for the tracker service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started tracker");

	let config = Config::from_file(
		args.config
			.to_str()
			.ok_or("Configuration path is not valid UTF-8")?,
	)
	.await?;
	tracing::info!("Loaded configuration [{}]", config.tracker.id);

	let engine = Arc::new(build_engine(config)?);
	resume_sessions(&engine).await?;

	let run_engine = Arc::clone(&engine);
	tokio::select! {
		result = run_engine.run() => {
			tracing::info!("Engine finished");
			result?;
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Interrupt received");
		}
	}

	engine.shutdown().await?;
	tracing::info!("Stopped tracker");
	Ok(())
}

/// Builds the tracker engine from the configured implementations.
fn build_engine(config: Config) -> Result<TrackerEngine, Box<dyn std::error::Error>> {
	let store: Box<dyn OrderStoreInterface> = match config.store.primary.as_str() {
		"memory" => Box::new(MemoryStore::new()),
		other => return Err(format!("Unknown store implementation: {}", other).into()),
	};

	let carrier: Box<dyn CarrierInterface> = match config.carrier.primary.as_str() {
		"http" => {
			let settings = config
				.carrier
				.implementations
				.get("http")
				.ok_or("Missing [carrier.implementations.http] section")?;
			let base_url = settings
				.get("base_url")
				.and_then(|v| v.as_str())
				.ok_or("Carrier 'http' requires a base_url")?;
			Box::new(HttpCarrier::new(base_url.to_string()))
		},
		other => return Err(format!("Unknown carrier implementation: {}", other).into()),
	};

	let mut transports: Vec<Box<dyn NotificationInterface>> = Vec::new();
	for name in config.notify.implementations.keys() {
		match name.as_str() {
			"channel" => {
				let (notifier, _publisher) = ChannelNotifier::new();
				transports.push(Box::new(notifier));
			},
			other => return Err(format!("Unknown notification transport: {}", other).into()),
		}
	}

	let request_timeout = Duration::from_secs(config.carrier.request_timeout_secs);
	Ok(TrackerEngine::new(
		config,
		StoreService::new(store),
		CarrierService::new(carrier, request_timeout),
		NotificationService::new(transports),
	))
}

/// Starts tracking sessions for every order already out with the
/// carrier, so a restart does not silently stop reconciliation.
async fn resume_sessions(engine: &TrackerEngine) -> Result<(), Box<dyn std::error::Error>> {
	let orders = engine
		.store()
		.list_orders(&OrderFilter {
			category: None,
			status: None,
		})
		.await?;

	let mut resumed = 0usize;
	for order in orders {
		let dispatched = order.status.implies_dispatch();
		let terminal = tracker_core::catalog::is_terminal(order.category, order.status);
		if dispatched && !terminal && order.carrier_ref.is_some() {
			engine.start_tracking_session(order)?;
			resumed += 1;
		}
	}

	if resumed > 0 {
		tracing::info!(count = resumed, "Resumed tracking sessions");
	}
	Ok(())
}
