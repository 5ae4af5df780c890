//! The tracker engine: public surface of the reconciliation system.
//!
//! The engine owns the wired services (store, carrier, notification
//! transport) and two registries: active per-order tracking sessions
//! and attached collection listeners. Sessions run a
//! [`ReconciliationPoller`](crate::reconcile::ReconciliationPoller)
//! each; listeners get push events fanned out into their own
//! [`EventCoalescer`](crate::refresh::EventCoalescer). Both registries
//! are keyed by id, and both kinds of handle detach idempotently.

pub mod event_bus;

use crate::engine::event_bus::EventBus;
use crate::reconcile::ReconciliationPoller;
use crate::refresh::{EventCoalescer, RefreshFn};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracker_carrier::CarrierService;
use tracker_config::Config;
use tracker_notify::NotificationService;
use tracker_store::StoreService;
use tracker_types::{Order, PushEvent};

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	/// A tracking session needs a carrier reference to poll against.
	#[error("Order {0} has no carrier reference")]
	MissingCarrierRef(String),
	/// At most one tracking session may exist per order.
	#[error("Order {0} already has an active tracking session")]
	SessionActive(String),
	/// The notification transport failed to start or stop.
	#[error("Notification transport error: {0}")]
	Notify(String),
}

/// An active tracking session in the registry.
#[derive(Debug)]
struct SessionEntry {
	shutdown: watch::Sender<bool>,
	/// Distinguishes this session from a later one under the same order
	/// id, so a finished poller only ever removes its own entry.
	epoch: u64,
}

/// An attached collection listener in the registry.
struct ListenerEntry {
	sender: mpsc::UnboundedSender<PushEvent>,
}

/// Handle to a running tracking session.
///
/// Dropping the handle does NOT stop the session; sessions outlive
/// their handles and end on terminal status, explicit stop, or engine
/// shutdown.
#[derive(Debug)]
pub struct SessionHandle {
	order_id: String,
	sessions: Arc<DashMap<String, SessionEntry>>,
}

impl SessionHandle {
	/// The id of the tracked order.
	pub fn order_id(&self) -> &str {
		&self.order_id
	}

	/// Stops the session. Safe to call any number of times, including
	/// after the poller already self-stopped on a terminal status.
	pub fn stop(&self) {
		stop_session(&self.sessions, &self.order_id);
	}
}

/// Handle to an attached collection listener.
pub struct ListenerHandle {
	collection_id: String,
	listeners: Arc<DashMap<String, ListenerEntry>>,
}

impl ListenerHandle {
	/// Detaches the listener. Pending debounce windows are abandoned;
	/// calling this twice is a no-op the second time.
	pub fn unsubscribe(&self) {
		if self.listeners.remove(&self.collection_id).is_some() {
			tracing::debug!(collection = %self.collection_id, "Collection listener detached");
		}
	}
}

fn stop_session(sessions: &DashMap<String, SessionEntry>, order_id: &str) {
	if let Some((_, entry)) = sessions.remove(order_id) {
		// The poller may have exited on its own already; a closed
		// channel here is not an error.
		entry.shutdown.send(true).ok();
		tracing::debug!(order_id = %order_id, "Tracking session stop requested");
	}
}

/// The reconciliation engine.
pub struct TrackerEngine {
	config: Config,
	store: Arc<StoreService>,
	carrier: Arc<CarrierService>,
	notify: Arc<NotificationService>,
	event_bus: EventBus,
	sessions: Arc<DashMap<String, SessionEntry>>,
	listeners: Arc<DashMap<String, ListenerEntry>>,
	next_epoch: AtomicU64,
}

impl TrackerEngine {
	/// Creates a new engine from configuration and wired services.
	pub fn new(
		config: Config,
		store: StoreService,
		carrier: CarrierService,
		notify: NotificationService,
	) -> Self {
		Self {
			config,
			store: Arc::new(store),
			carrier: Arc::new(carrier),
			notify: Arc::new(notify),
			event_bus: EventBus::default(),
			sessions: Arc::new(DashMap::new()),
			listeners: Arc::new(DashMap::new()),
			next_epoch: AtomicU64::new(0),
		}
	}

	/// The engine's event bus; subscribe for applied transitions,
	/// poller health, and session lifecycle.
	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// The order store behind the engine.
	pub fn store(&self) -> &Arc<StoreService> {
		&self.store
	}

	/// Starts a periodic reconciliation session for one order.
	///
	/// Rejects orders without a carrier reference and orders that
	/// already have an active session. The first reconciliation cycle
	/// runs immediately.
	pub fn start_tracking_session(&self, order: Order) -> Result<SessionHandle, EngineError> {
		if order.carrier_ref.is_none() {
			return Err(EngineError::MissingCarrierRef(order.id));
		}

		let (shutdown_tx, shutdown_rx) = watch::channel(false);
		let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);

		// The entry goes into the registry before the task spawns, so
		// a poller that stops instantly (terminal order) still finds
		// its own entry to remove.
		match self.sessions.entry(order.id.clone()) {
			Entry::Occupied(_) => return Err(EngineError::SessionActive(order.id)),
			Entry::Vacant(vacant) => {
				vacant.insert(SessionEntry {
					shutdown: shutdown_tx,
					epoch,
				});
			},
		}

		let poller = ReconciliationPoller::new(
			Arc::clone(&self.store),
			Arc::clone(&self.carrier),
			self.event_bus.clone(),
			Duration::from_secs(self.config.tracker.poll_interval_secs),
			self.config.tracker.persistence_warn_cycles,
		);
		let sessions = Arc::clone(&self.sessions);
		let order_id = order.id.clone();
		let task_order_id = order_id.clone();
		tokio::spawn(async move {
			poller.run(order, shutdown_rx).await;
			// Only this session's own entry; a replacement session
			// started after an explicit stop keeps its registration.
			sessions.remove_if(&task_order_id, |_, entry| entry.epoch == epoch);
		});

		tracing::info!(order_id = %order_id, "Tracking session started");
		Ok(SessionHandle {
			order_id,
			sessions: Arc::clone(&self.sessions),
		})
	}

	/// Stops a tracking session by order id. Unknown or already-stopped
	/// ids are a silent no-op.
	pub fn stop_tracking_session(&self, order_id: &str) {
		stop_session(&self.sessions, order_id);
	}

	/// Attaches a debounced refresh listener for a collection view.
	///
	/// Push events matching the listener's subscriptions coalesce into
	/// a single silent refetch per quiet period. Attaching under an id
	/// that is already registered replaces the previous listener.
	pub fn attach_collection_listener(
		&self,
		collection_id: &str,
		refresh: RefreshFn,
	) -> ListenerHandle {
		let (tx, rx) = mpsc::unbounded_channel();
		let coalescer = EventCoalescer::new(
			collection_id.to_string(),
			Duration::from_millis(self.config.tracker.debounce_ms),
			refresh,
		);
		tokio::spawn(coalescer.run(rx));

		// Replacing drops the previous sender, which ends the previous
		// coalescer task.
		self.listeners
			.insert(collection_id.to_string(), ListenerEntry { sender: tx });
		tracing::debug!(collection = %collection_id, "Collection listener attached");

		ListenerHandle {
			collection_id: collection_id.to_string(),
			listeners: Arc::clone(&self.listeners),
		}
	}

	/// Runs the engine's event loop.
	///
	/// Starts all notification transports and fans incoming push events
	/// out to the attached listeners. Returns when every transport has
	/// stopped delivering (see [`shutdown`](Self::shutdown)).
	pub async fn run(&self) -> Result<(), EngineError> {
		let (tx, mut rx) = mpsc::unbounded_channel();
		self.notify
			.start_all(tx)
			.await
			.map_err(|e| EngineError::Notify(e.to_string()))?;
		tracing::info!(tracker_id = %self.config.tracker.id, "Engine running");

		while let Some(event) = rx.recv().await {
			tracing::trace!(event_type = event.event_type(), order_id = event.order_id(), "Push event received");
			// Drop listeners whose coalescer is gone.
			self.listeners
				.retain(|_, entry| entry.sender.send(event.clone()).is_ok());
		}

		tracing::info!("Engine event loop ended");
		Ok(())
	}

	/// Shuts the engine down: stops the notification transports, every
	/// active tracking session, and detaches all listeners.
	pub async fn shutdown(&self) -> Result<(), EngineError> {
		self.notify
			.stop_all()
			.await
			.map_err(|e| EngineError::Notify(e.to_string()))?;

		let active: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
		for order_id in active {
			stop_session(&self.sessions, &order_id);
		}
		self.listeners.clear();

		tracing::info!("Engine shut down");
		Ok(())
	}
}
