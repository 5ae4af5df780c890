//! Event bus for engine-to-collaborator communication.
//!
//! A thin wrapper over a tokio broadcast channel. The engine publishes
//! [`TrackerEvent`]s (applied transitions, poller health, session
//! lifecycle); UI collaborators subscribe and react. Publishing with no
//! subscribers is fine; events are advisory, not load-bearing.

use tokio::sync::broadcast;
use tracker_types::TrackerEvent;

/// Default capacity of the broadcast buffer.
const DEFAULT_CAPACITY: usize = 256;

/// Broadcast bus for tracker events.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<TrackerEvent>,
}

impl EventBus {
	/// Creates a new event bus with the given buffer capacity.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Publishes an event to all current subscribers.
	///
	/// Returns Err when there are no subscribers; callers treat that as
	/// non-fatal (`.ok()`).
	pub fn publish(
		&self,
		event: TrackerEvent,
	) -> Result<usize, broadcast::error::SendError<TrackerEvent>> {
		self.sender.send(event)
	}

	/// Creates a new subscription to the bus.
	pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
		self.sender.subscribe()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}
