//! Order store module for the tracker system.
//!
//! This module provides abstractions for the persistence of order
//! records, supporting different backend implementations such as
//! in-memory or database-backed stores. All status mutation flows
//! through [`OrderStoreInterface::update_status`], which is idempotent
//! at the application level: re-applying an identical
//! `(status, carrier_ref)` pair is a safe no-op.

use async_trait::async_trait;
use thiserror::Error;
use tracker_types::{Order, OrderFilter, OrderStatus};

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
	/// Error that occurs when a requested order is not found.
	#[error("Order not found: {0}")]
	NotFound(String),
	/// Error that occurs when an update violates a record invariant.
	#[error("Invariant violation: {0}")]
	Invariant(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Trait defining the low-level interface for order store backends.
///
/// This trait must be implemented by any store backend that wants to
/// integrate with the tracker. The backend owns record-level
/// invariants: it must not trust callers to pre-validate, even though
/// the transition guard filters duplicates and illegal moves before
/// update_status is ever called.
#[async_trait]
pub trait OrderStoreInterface: Send + Sync {
	/// Retrieves an order by id.
	async fn get_order(&self, id: &str) -> Result<Order, StoreError>;

	/// Persists a new status for an order, forwarding the carrier
	/// reference when one exists.
	///
	/// Re-applying the current `(status, carrier_ref)` pair succeeds
	/// without touching the record. A status that implies dispatch
	/// requires a carrier reference, either already on the record or
	/// provided with the call.
	async fn update_status(
		&self,
		id: &str,
		new_status: OrderStatus,
		carrier_ref: Option<&str>,
	) -> Result<(), StoreError>;

	/// Lists orders matching the given filter.
	async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError>;

	/// Inserts a new order record.
	async fn insert_order(&self, order: Order) -> Result<(), StoreError>;
}

/// High-level store service.
///
/// The StoreService wraps a store backend behind a stable surface so
/// the engine does not care which implementation is configured.
pub struct StoreService {
	/// The underlying store backend implementation.
	backend: Box<dyn OrderStoreInterface>,
}

impl StoreService {
	/// Creates a new StoreService with the specified backend.
	pub fn new(backend: Box<dyn OrderStoreInterface>) -> Self {
		Self { backend }
	}

	/// Retrieves an order by id.
	pub async fn get_order(&self, id: &str) -> Result<Order, StoreError> {
		self.backend.get_order(id).await
	}

	/// Persists a new status for an order.
	pub async fn update_status(
		&self,
		id: &str,
		new_status: OrderStatus,
		carrier_ref: Option<&str>,
	) -> Result<(), StoreError> {
		self.backend.update_status(id, new_status, carrier_ref).await
	}

	/// Lists orders matching the given filter.
	pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
		self.backend.list_orders(filter).await
	}

	/// Inserts a new order record.
	pub async fn insert_order(&self, order: Order) -> Result<(), StoreError> {
		self.backend.insert_order(order).await
	}
}
