//! Carrier integration module for the tracker system.
//!
//! This module handles tracking lookups against the third-party
//! shipping carrier. It provides abstractions for different transport
//! mechanisms (HTTP today) and a service wrapper that enforces the
//! configured request timeout. The carrier's vocabulary is returned
//! raw; translating it into internal status codes is the engine's job.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

/// Errors that can occur during carrier operations.
///
/// All of these are transient from the engine's point of view: a failed
/// lookup is retried naturally on the next reconciliation cycle.
#[derive(Debug, Error)]
pub enum CarrierError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when a lookup exceeds the configured timeout.
	#[error("Tracking lookup timed out")]
	Timeout,
	/// Error that occurs when the carrier response cannot be decoded.
	#[error("Decode error: {0}")]
	Decode(String),
}

/// Trait defining the interface for carrier tracking providers.
///
/// This trait must be implemented by any carrier integration that wants
/// to plug into the tracker. It returns the carrier's raw status code
/// untranslated.
#[async_trait]
pub trait CarrierInterface: Send + Sync {
	/// Looks up the current tracking state for a shipment.
	///
	/// Returns the carrier's raw status string for the given tracking
	/// reference, or a transport error.
	async fn track_shipment(&self, carrier_ref: &str) -> Result<String, CarrierError>;
}

/// Service that manages tracking lookups against the carrier.
///
/// The CarrierService wraps a carrier provider and bounds every lookup
/// with the configured request timeout so a hung connection cannot
/// stall a reconciliation cycle past the next tick.
pub struct CarrierService {
	/// The underlying carrier provider.
	provider: Box<dyn CarrierInterface>,
	/// Maximum duration of a single tracking lookup.
	request_timeout: Duration,
}

impl CarrierService {
	/// Creates a new CarrierService with the specified provider and timeout.
	pub fn new(provider: Box<dyn CarrierInterface>, request_timeout: Duration) -> Self {
		Self {
			provider,
			request_timeout,
		}
	}

	/// Looks up the current tracking state for a shipment, bounded by
	/// the configured timeout.
	pub async fn track_shipment(&self, carrier_ref: &str) -> Result<String, CarrierError> {
		match tokio::time::timeout(self.request_timeout, self.provider.track_shipment(carrier_ref))
			.await
		{
			Ok(result) => result,
			Err(_) => Err(CarrierError::Timeout),
		}
	}
}
