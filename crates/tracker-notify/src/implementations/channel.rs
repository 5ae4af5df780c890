//! In-process channel notification transport.
//!
//! Backed by a tokio broadcast channel. The [`ChannelPublisher`] half is
//! handed to whatever produces events (tests, a local demo feed); the
//! transport half forwards everything published to the engine once
//! listening starts. Events published while not listening are dropped,
//! which matches the fire-and-forget nature of the real push stream.

use crate::{NotificationInterface, NotifyError};
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracker_types::PushEvent;

/// Capacity of the broadcast buffer between publisher and forwarder.
const CHANNEL_CAPACITY: usize = 256;

/// Publisher half of the channel transport.
#[derive(Clone)]
pub struct ChannelPublisher {
	sender: broadcast::Sender<PushEvent>,
}

impl ChannelPublisher {
	/// Publishes a push event.
	///
	/// Events published with no active listener are silently dropped.
	pub fn publish(&self, event: PushEvent) {
		let _ = self.sender.send(event);
	}
}

/// In-process channel notification transport.
pub struct ChannelNotifier {
	sender: broadcast::Sender<PushEvent>,
	forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl ChannelNotifier {
	/// Creates a new channel transport plus its publisher half.
	pub fn new() -> (Self, ChannelPublisher) {
		let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
		let publisher = ChannelPublisher {
			sender: sender.clone(),
		};
		let notifier = Self {
			sender,
			forwarder: Mutex::new(None),
		};
		(notifier, publisher)
	}
}

#[async_trait]
impl NotificationInterface for ChannelNotifier {
	async fn start_listening(
		&self,
		sender: mpsc::UnboundedSender<PushEvent>,
	) -> Result<(), NotifyError> {
		let mut forwarder = self.forwarder.lock().await;
		if forwarder.is_some() {
			return Err(NotifyError::AlreadyListening);
		}

		let mut receiver = self.sender.subscribe();
		let handle = tokio::spawn(async move {
			loop {
				match receiver.recv().await {
					Ok(event) => {
						if sender.send(event).is_err() {
							// Engine side went away; nothing left to do.
							break;
						}
					},
					Err(broadcast::error::RecvError::Lagged(missed)) => {
						tracing::warn!(missed, "Push event forwarder lagged");
					},
					Err(broadcast::error::RecvError::Closed) => break,
				}
			}
		});
		*forwarder = Some(handle);
		Ok(())
	}

	async fn stop_listening(&self) -> Result<(), NotifyError> {
		let mut forwarder = self.forwarder.lock().await;
		if let Some(handle) = forwarder.take() {
			handle.abort();
		}
		Ok(())
	}
}
