//! Event types for inter-component communication.
//!
//! Two event families live here: [`PushEvent`], delivered by the
//! notification transport when the backend reports order activity, and
//! [`TrackerEvent`], published on the engine's event bus so UI
//! collaborators can react to reconciliation outcomes.

use crate::order::OrderStatus;
use serde::{Deserialize, Serialize};

/// A push notification event about order activity.
///
/// These arrive over the notification transport, typically in bursts,
/// and are consumed by collection listeners after debouncing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PushEvent {
	/// A new order was placed.
	OrderCreated { order_id: String },
	/// An existing order changed (status, fields, anything).
	OrderUpdated { order_id: String },
	/// An order was cancelled.
	OrderCancelled { order_id: String },
}

impl PushEvent {
	/// Wire name of this event type.
	pub fn event_type(&self) -> &'static str {
		match self {
			PushEvent::OrderCreated { .. } => "order.created",
			PushEvent::OrderUpdated { .. } => "order.updated",
			PushEvent::OrderCancelled { .. } => "order.cancelled",
		}
	}

	/// Identifier of the order this event refers to.
	pub fn order_id(&self) -> &str {
		match self {
			PushEvent::OrderCreated { order_id } => order_id,
			PushEvent::OrderUpdated { order_id } => order_id,
			PushEvent::OrderCancelled { order_id } => order_id,
		}
	}
}

/// Events published on the engine's event bus.
///
/// UI collaborators subscribe to these to learn about applied
/// transitions and poller health without polling the store themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackerEvent {
	/// A reconciliation cycle applied and persisted a status change.
	StatusChanged {
		order_id: String,
		from: OrderStatus,
		to: OrderStatus,
	},
	/// The store rejected the same legal transition for several
	/// consecutive cycles; a user-visible warning is warranted.
	PersistenceLagging { order_id: String, attempts: u32 },
	/// A tracking session ended (terminal status reached or stopped).
	SessionEnded { order_id: String },
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn event_type_names_are_stable() {
		let created = PushEvent::OrderCreated {
			order_id: "o1".into(),
		};
		let updated = PushEvent::OrderUpdated {
			order_id: "o1".into(),
		};
		let cancelled = PushEvent::OrderCancelled {
			order_id: "o1".into(),
		};
		assert_eq!(created.event_type(), "order.created");
		assert_eq!(updated.event_type(), "order.updated");
		assert_eq!(cancelled.event_type(), "order.cancelled");
		assert_eq!(created.order_id(), "o1");
	}
}
