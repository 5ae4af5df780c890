//! Push-notification transport module for the tracker system.
//!
//! This module handles the delivery of real-time order events into the
//! engine. It provides abstractions for different transport mechanisms
//! (an in-process channel today; a websocket or message-queue consumer
//! would slot in the same way). The transport only delivers events;
//! debouncing and refresh policy live in the engine.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracker_types::PushEvent;

/// Re-export implementations
pub mod implementations {
	pub mod channel;
}

/// Errors that can occur during notification transport operations.
#[derive(Debug, Error)]
pub enum NotifyError {
	/// Error that occurs when connecting to the transport fails.
	#[error("Connection error: {0}")]
	Connection(String),
	/// Error that occurs when trying to start an already-listening transport.
	#[error("Already listening")]
	AlreadyListening,
}

/// Trait defining the interface for notification transports.
///
/// This trait must be implemented by any transport that wants to feed
/// push events into the tracker. Delivered events are sent through the
/// provided channel until stop_listening is called.
#[async_trait]
pub trait NotificationInterface: Send + Sync {
	/// Starts delivering push events through the provided channel.
	async fn start_listening(
		&self,
		sender: mpsc::UnboundedSender<PushEvent>,
	) -> Result<(), NotifyError>;

	/// Stops delivering push events.
	///
	/// This method should cleanly shut down any active delivery tasks
	/// and release associated resources. Stopping an idle transport is
	/// a no-op.
	async fn stop_listening(&self) -> Result<(), NotifyError>;
}

/// Service that manages multiple notification transports.
///
/// The NotificationService coordinates the configured transports,
/// allowing the engine to receive events from several channels through
/// a single receiver.
pub struct NotificationService {
	/// Collection of transports to listen on.
	implementations: Vec<Box<dyn NotificationInterface>>,
}

impl NotificationService {
	/// Creates a new NotificationService with the specified transports.
	pub fn new(implementations: Vec<Box<dyn NotificationInterface>>) -> Self {
		Self { implementations }
	}

	/// Starts listening on all configured transports.
	///
	/// All events from any transport are sent through the provided
	/// channel. If any transport fails to start, the operation fails.
	pub async fn start_all(
		&self,
		sender: mpsc::UnboundedSender<PushEvent>,
	) -> Result<(), NotifyError> {
		for implementation in &self.implementations {
			implementation.start_listening(sender.clone()).await?;
		}
		Ok(())
	}

	/// Stops listening on all active transports.
	pub async fn stop_all(&self) -> Result<(), NotifyError> {
		for implementation in &self.implementations {
			implementation.stop_listening().await?;
		}
		Ok(())
	}
}
