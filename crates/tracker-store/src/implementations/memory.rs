//! In-memory order store implementation.
//!
//! This module provides a memory-based implementation of the
//! OrderStoreInterface trait, useful for tests and local development
//! where persistence across restarts is not required.

use crate::{OrderStoreInterface, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracker_types::{Order, OrderFilter, OrderStatus};

/// In-memory order store.
///
/// Orders live in a HashMap behind a read-write lock, providing fast
/// access but no persistence across restarts.
pub struct MemoryStore {
	/// The in-memory records protected by a read-write lock.
	orders: Arc<RwLock<HashMap<String, Order>>>,
}

impl MemoryStore {
	/// Creates a new, empty MemoryStore instance.
	pub fn new() -> Self {
		Self {
			orders: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	fn now() -> u64 {
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.unwrap_or_default()
			.as_secs()
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl OrderStoreInterface for MemoryStore {
	async fn get_order(&self, id: &str) -> Result<Order, StoreError> {
		let orders = self.orders.read().await;
		orders
			.get(id)
			.cloned()
			.ok_or_else(|| StoreError::NotFound(id.to_string()))
	}

	async fn update_status(
		&self,
		id: &str,
		new_status: OrderStatus,
		carrier_ref: Option<&str>,
	) -> Result<(), StoreError> {
		let mut orders = self.orders.write().await;
		let order = orders
			.get_mut(id)
			.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

		// Idempotent re-apply: same status and same carrier ref leave
		// the record untouched (including updated_at).
		if order.status == new_status && order.carrier_ref.as_deref() == carrier_ref {
			tracing::trace!(order_id = %id, status = %new_status, "Duplicate update ignored");
			return Ok(());
		}

		if new_status.implies_dispatch() && carrier_ref.is_none() && order.carrier_ref.is_none() {
			return Err(StoreError::Invariant(format!(
				"Status {} requires a carrier reference",
				new_status
			)));
		}

		order.status = new_status;
		if let Some(carrier_ref) = carrier_ref {
			order.carrier_ref = Some(carrier_ref.to_string());
		}
		order.updated_at = Self::now();
		Ok(())
	}

	async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
		let orders = self.orders.read().await;
		Ok(orders.values().filter(|o| filter.matches(o)).cloned().collect())
	}

	async fn insert_order(&self, order: Order) -> Result<(), StoreError> {
		let mut orders = self.orders.write().await;
		orders.insert(order.id.clone(), order);
		Ok(())
	}
}
