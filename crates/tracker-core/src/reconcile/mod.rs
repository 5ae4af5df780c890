//! Per-order reconciliation against carrier truth.
//!
//! One poller per tracked order fetches the carrier's tracking state at
//! a fixed interval, maps it into the internal vocabulary, and requests
//! a transition through the guard. Cycles within one order are strictly
//! sequential: the timer skips ticks that would overlap a slow cycle
//! rather than queueing them. The poller self-stops when the order
//! reaches a terminal status; callers stop it on session teardown.

use crate::catalog;
use crate::engine::event_bus::EventBus;
use crate::mapper::map_carrier_status;
use crate::state::{TransitionError, TransitionGuard, TransitionOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::instrument;
use tracker_carrier::CarrierService;
use tracker_store::StoreService;
use tracker_types::{Order, TrackerEvent};

/// Outcome of a single reconciliation cycle.
#[derive(Debug, PartialEq, Eq)]
enum CycleOutcome {
	/// Keep the timer running.
	Continue,
	/// The session is done; no further cycles, ever, for this order.
	Stop,
}

/// Polls the carrier for one order and applies legal transitions.
pub struct ReconciliationPoller {
	store: Arc<StoreService>,
	carrier: Arc<CarrierService>,
	event_bus: EventBus,
	poll_interval: Duration,
	warn_cycles: u32,
}

impl ReconciliationPoller {
	pub fn new(
		store: Arc<StoreService>,
		carrier: Arc<CarrierService>,
		event_bus: EventBus,
		poll_interval: Duration,
		warn_cycles: u32,
	) -> Self {
		Self {
			store,
			carrier,
			event_bus,
			poll_interval,
			warn_cycles,
		}
	}

	/// Runs the reconciliation loop until terminal status or shutdown.
	///
	/// The first cycle runs immediately; afterwards one cycle per tick.
	/// Shutdown takes effect for future ticks only; an in-flight cycle
	/// completes (it touches only this order's record, so that is safe).
	#[instrument(skip_all, fields(order_id = %order.id))]
	pub async fn run(&self, mut order: Order, mut shutdown: watch::Receiver<bool>) {
		let mut interval = tokio::time::interval(self.poll_interval);
		interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

		let mut persist_failures = 0u32;

		loop {
			tokio::select! {
				changed = shutdown.changed() => {
					if changed.is_err() || *shutdown.borrow() {
						tracing::debug!("Tracking session stopped");
						break;
					}
				}
				_ = interval.tick() => {
					if self.cycle(&mut order, &mut persist_failures).await == CycleOutcome::Stop {
						break;
					}
				}
			}
		}

		self.event_bus
			.publish(TrackerEvent::SessionEnded {
				order_id: order.id.clone(),
			})
			.ok();
	}

	/// One reconciliation cycle.
	async fn cycle(&self, order: &mut Order, persist_failures: &mut u32) -> CycleOutcome {
		// Terminal orders are frozen: stop the timer for good.
		if catalog::is_terminal(order.category, order.status) {
			tracing::debug!(status = %order.status, "Order is terminal; polling stops");
			return CycleOutcome::Stop;
		}

		let Some(carrier_ref) = order.carrier_ref.clone() else {
			tracing::debug!("No carrier reference yet; nothing to reconcile");
			return CycleOutcome::Continue;
		};

		let raw = match self.carrier.track_shipment(&carrier_ref).await {
			Ok(raw) => raw,
			Err(e) => {
				// Transient: the next tick retries naturally.
				tracing::warn!(error = %e, "Carrier unavailable");
				return CycleOutcome::Continue;
			},
		};

		let Some(proposed) = map_carrier_status(&raw) else {
			tracing::debug!(raw = %raw, "Unrecognized carrier status; no action");
			return CycleOutcome::Continue;
		};

		match TransitionGuard::request_transition(order, proposed) {
			Ok(TransitionOutcome::Applied) => {
				match self
					.store
					.update_status(&order.id, proposed, order.carrier_ref.as_deref())
					.await
				{
					Ok(()) => {
						*persist_failures = 0;
						tracing::info!(from = %order.status, to = %proposed, "Status reconciled");
						self.event_bus
							.publish(TrackerEvent::StatusChanged {
								order_id: order.id.clone(),
								from: order.status,
								to: proposed,
							})
							.ok();
						// Refresh the in-memory status so the next
						// cycle evaluates the terminal check against
						// what was actually persisted.
						order.status = proposed;
					},
					Err(e) => {
						// In-memory status stays behind so the same
						// transition is retried next tick.
						*persist_failures += 1;
						tracing::warn!(
							error = %e,
							attempts = *persist_failures,
							"Failed to persist reconciled status"
						);
						if *persist_failures >= self.warn_cycles {
							self.event_bus
								.publish(TrackerEvent::PersistenceLagging {
									order_id: order.id.clone(),
									attempts: *persist_failures,
								})
								.ok();
						}
					},
				}
				CycleOutcome::Continue
			},
			Ok(TransitionOutcome::NoOp) => {
				tracing::trace!(status = %order.status, "Carrier report matches current status");
				CycleOutcome::Continue
			},
			Err(TransitionError::AlreadyTerminal { status }) => {
				tracing::debug!(status = %status, "Order terminal; polling stops");
				CycleOutcome::Stop
			},
			Err(TransitionError::IllegalTransition { from, to }) => {
				// Stale or out-of-order carrier reports are expected;
				// ignore them without raising.
				tracing::debug!(from = %from, to = %to, "Ignoring illegal carrier transition");
				CycleOutcome::Continue
			},
			Err(e @ TransitionError::UnknownStatus { .. }) => {
				// Corrupt data: no forward progress is possible until
				// the record is repaired, so the session stops.
				tracing::error!(error = %e, "Order status outside its catalog");
				CycleOutcome::Stop
			},
		}
	}
}
