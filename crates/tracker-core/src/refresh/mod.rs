//! Debounced refresh of collection views from push events.
//!
//! Push notifications arrive in bursts; a collection view wants one
//! silent refetch per burst, never a visible loading state and never a
//! pile-up of concurrent refreshes. Each attached collection gets an
//! [`EventCoalescer`]: relevant events open (or reschedule) a debounce
//! window, and when the window elapses quietly a single refresh fires.
//! At most one refresh runs at a time per collection: a firing that
//! lands while one is in flight is dropped, not queued, and the next
//! event naturally schedules another attempt.

use futures::future::BoxFuture;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracker_types::PushEvent;

/// Error returned by a failed silent refetch.
///
/// Logged and not retried; the next incoming event triggers the next
/// attempt.
#[derive(Debug, Error)]
#[error("Refresh failed: {0}")]
pub struct RefreshError(pub String);

/// Async callback that performs the silent refetch of a collection.
pub type RefreshFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), RefreshError>> + Send + Sync>;

/// Debounced consumer of push events for one collection view.
pub struct EventCoalescer {
	collection_id: String,
	debounce: Duration,
	subscribed: HashSet<&'static str>,
	refresh: RefreshFn,
	in_flight: Arc<AtomicBool>,
}

impl EventCoalescer {
	/// Creates a coalescer subscribed to all order events.
	pub fn new(collection_id: String, debounce: Duration, refresh: RefreshFn) -> Self {
		Self {
			collection_id,
			debounce,
			subscribed: HashSet::from(["order.created", "order.updated", "order.cancelled"]),
			refresh,
			in_flight: Arc::new(AtomicBool::new(false)),
		}
	}

	/// Restricts the subscribed event types.
	pub fn with_subscriptions(mut self, event_types: &[&'static str]) -> Self {
		self.subscribed = event_types.iter().copied().collect();
		self
	}

	/// Consumes events until the channel closes (listener detached).
	pub async fn run(self, mut events: mpsc::UnboundedReceiver<PushEvent>) {
		while let Some(event) = events.recv().await {
			if !self.subscribed.contains(event.event_type()) {
				continue;
			}

			// A relevant event opened the window; further relevant
			// events push the deadline out until the burst quiets down.
			let mut deadline = Instant::now() + self.debounce;
			loop {
				tokio::select! {
					_ = tokio::time::sleep_until(deadline) => {
						self.fire();
						break;
					}
					next = events.recv() => match next {
						Some(event) if self.subscribed.contains(event.event_type()) => {
							deadline = Instant::now() + self.debounce;
						},
						Some(_) => {},
						// Detached mid-window: the pending refresh is
						// abandoned along with the listener.
						None => return,
					}
				}
			}
		}
	}

	/// Fires one refresh, unless one is already in flight.
	fn fire(&self) {
		if self.in_flight.swap(true, Ordering::AcqRel) {
			tracing::debug!(
				collection = %self.collection_id,
				"Refresh already in flight; coalesced firing dropped"
			);
			return;
		}

		let refresh = Arc::clone(&self.refresh);
		let in_flight = Arc::clone(&self.in_flight);
		let collection_id = self.collection_id.clone();
		tokio::spawn(async move {
			if let Err(e) = (refresh)().await {
				tracing::warn!(collection = %collection_id, error = %e, "Silent refresh failed");
			}
			in_flight.store(false, Ordering::Release);
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::AtomicUsize;
	use tokio::time::advance;

	fn counting_refresh() -> (RefreshFn, Arc<AtomicUsize>) {
		let count = Arc::new(AtomicUsize::new(0));
		let counted = Arc::clone(&count);
		let refresh: RefreshFn = Arc::new(move || {
			let counted = Arc::clone(&counted);
			Box::pin(async move {
				counted.fetch_add(1, Ordering::SeqCst);
				Ok(())
			})
		});
		(refresh, count)
	}

	fn updated(id: &str) -> PushEvent {
		PushEvent::OrderUpdated {
			order_id: id.to_string(),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn burst_of_events_triggers_exactly_one_refresh() {
		let (refresh, count) = counting_refresh();
		let coalescer =
			EventCoalescer::new("orders".to_string(), Duration::from_millis(300), refresh);
		let (tx, rx) = mpsc::unbounded_channel();
		let task = tokio::spawn(coalescer.run(rx));

		for i in 0..5 {
			tx.send(updated(&format!("o{i}"))).unwrap();
		}
		tokio::task::yield_now().await;

		advance(Duration::from_millis(301)).await;
		tokio::task::yield_now().await;
		assert_eq!(count.load(Ordering::SeqCst), 1);

		// Quiet afterwards: still exactly one.
		advance(Duration::from_secs(5)).await;
		tokio::task::yield_now().await;
		assert_eq!(count.load(Ordering::SeqCst), 1);

		drop(tx);
		task.await.unwrap();
	}

	#[tokio::test(start_paused = true)]
	async fn later_events_reschedule_the_window() {
		let (refresh, count) = counting_refresh();
		let coalescer =
			EventCoalescer::new("orders".to_string(), Duration::from_millis(300), refresh);
		let (tx, rx) = mpsc::unbounded_channel();
		let task = tokio::spawn(coalescer.run(rx));

		tx.send(updated("o1")).unwrap();
		tokio::task::yield_now().await;
		advance(Duration::from_millis(200)).await;
		tx.send(updated("o2")).unwrap();
		tokio::task::yield_now().await;

		// 300 ms after the first event, but only 100 ms after the
		// second: the window was pushed out, nothing fired yet.
		advance(Duration::from_millis(150)).await;
		tokio::task::yield_now().await;
		assert_eq!(count.load(Ordering::SeqCst), 0);

		advance(Duration::from_millis(200)).await;
		tokio::task::yield_now().await;
		assert_eq!(count.load(Ordering::SeqCst), 1);

		drop(tx);
		task.await.unwrap();
	}

	#[tokio::test(start_paused = true)]
	async fn unsubscribed_event_types_are_ignored() {
		let (refresh, count) = counting_refresh();
		let coalescer =
			EventCoalescer::new("orders".to_string(), Duration::from_millis(300), refresh)
				.with_subscriptions(&["order.cancelled"]);
		let (tx, rx) = mpsc::unbounded_channel();
		let task = tokio::spawn(coalescer.run(rx));

		tx.send(updated("o1")).unwrap();
		tx.send(PushEvent::OrderCreated {
			order_id: "o2".to_string(),
		})
		.unwrap();
		tokio::task::yield_now().await;

		advance(Duration::from_secs(2)).await;
		tokio::task::yield_now().await;
		assert_eq!(count.load(Ordering::SeqCst), 0);

		tx.send(PushEvent::OrderCancelled {
			order_id: "o3".to_string(),
		})
		.unwrap();
		tokio::task::yield_now().await;
		advance(Duration::from_millis(301)).await;
		tokio::task::yield_now().await;
		assert_eq!(count.load(Ordering::SeqCst), 1);

		drop(tx);
		task.await.unwrap();
	}

	#[tokio::test(start_paused = true)]
	async fn firing_while_in_flight_is_dropped() {
		let started = Arc::new(AtomicUsize::new(0));
		let started_in_refresh = Arc::clone(&started);
		// A refresh that takes 10 s: the second firing lands inside it.
		let refresh: RefreshFn = Arc::new(move || {
			let started = Arc::clone(&started_in_refresh);
			Box::pin(async move {
				started.fetch_add(1, Ordering::SeqCst);
				tokio::time::sleep(Duration::from_secs(10)).await;
				Ok(())
			})
		});
		let coalescer =
			EventCoalescer::new("orders".to_string(), Duration::from_millis(300), refresh);
		let (tx, rx) = mpsc::unbounded_channel();
		let task = tokio::spawn(coalescer.run(rx));

		tx.send(updated("o1")).unwrap();
		tokio::task::yield_now().await;
		advance(Duration::from_millis(301)).await;
		tokio::task::yield_now().await;
		assert_eq!(started.load(Ordering::SeqCst), 1);

		// Second burst fires while the first refresh is still running.
		tx.send(updated("o2")).unwrap();
		tokio::task::yield_now().await;
		advance(Duration::from_millis(301)).await;
		tokio::task::yield_now().await;
		assert_eq!(started.load(Ordering::SeqCst), 1);

		// After the first refresh completes, a new event gets through.
		advance(Duration::from_secs(10)).await;
		tokio::task::yield_now().await;
		tx.send(updated("o3")).unwrap();
		tokio::task::yield_now().await;
		advance(Duration::from_millis(301)).await;
		tokio::task::yield_now().await;
		assert_eq!(started.load(Ordering::SeqCst), 2);

		drop(tx);
		task.await.unwrap();
	}

	#[tokio::test(start_paused = true)]
	async fn failed_refresh_is_not_retried() {
		let attempts = Arc::new(AtomicUsize::new(0));
		let attempts_in_refresh = Arc::clone(&attempts);
		let refresh: RefreshFn = Arc::new(move || {
			let attempts = Arc::clone(&attempts_in_refresh);
			Box::pin(async move {
				attempts.fetch_add(1, Ordering::SeqCst);
				Err(RefreshError("backend down".to_string()))
			})
		});
		let coalescer =
			EventCoalescer::new("orders".to_string(), Duration::from_millis(300), refresh);
		let (tx, rx) = mpsc::unbounded_channel();
		let task = tokio::spawn(coalescer.run(rx));

		tx.send(updated("o1")).unwrap();
		tokio::task::yield_now().await;
		advance(Duration::from_secs(5)).await;
		tokio::task::yield_now().await;
		assert_eq!(attempts.load(Ordering::SeqCst), 1);

		// The next event naturally triggers another attempt.
		tx.send(updated("o2")).unwrap();
		tokio::task::yield_now().await;
		advance(Duration::from_millis(301)).await;
		tokio::task::yield_now().await;
		assert_eq!(attempts.load(Ordering::SeqCst), 2);

		drop(tx);
		task.await.unwrap();
	}
}
