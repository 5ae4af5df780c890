//! Order domain types for the tracker system.
//!
//! This module defines the order record, its category, the closed set of
//! lifecycle statuses, and the filter used when listing orders. Which
//! statuses an order may actually hold, and in which sequence, is owned
//! by the status catalog in the core crate; the types here are the
//! shared vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Product category of an order.
///
/// The category decides which status catalog (membership, ordinals,
/// transition edges) applies to the order's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderCategory {
	/// Stock item produced from an existing template.
	Template,
	/// Template-based item with customer-specific adjustments.
	CustomTemplate,
	/// Fully bespoke design, drafted and approved before production.
	NewDesign,
}

impl fmt::Display for OrderCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderCategory::Template => write!(f, "template"),
			OrderCategory::CustomTemplate => write!(f, "customTemplate"),
			OrderCategory::NewDesign => write!(f, "newDesign"),
		}
	}
}

/// Lifecycle status of an order.
///
/// A single closed enum shared by all categories; the per-category
/// catalogs restrict which of these an order of a given category may
/// hold. Statuses only ever move forward through the catalog's
/// transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
	/// Order has been placed but not yet acted on.
	Pending,
	/// Deposit received; production may be scheduled.
	DepositPaid,
	/// Bespoke design is being drafted.
	InDesign,
	/// Customer approved the design draft.
	DesignApproved,
	/// In production / handed to the carrier for pickup.
	Processing,
	/// Carrier has the shipment out for delivery.
	PickedUpForDelivery,
	/// A delivery attempt failed.
	DeliveryFailed,
	/// Shipment is queued for another delivery attempt.
	Redelivery,
	/// Delivered and signed for.
	DeliveredSuccessfully,
	/// Order was cancelled.
	OrderCancelled,
}

impl OrderStatus {
	/// Whether this status means the carrier already holds the shipment.
	///
	/// An order at a dispatch-implying status must carry a carrier
	/// tracking reference.
	pub fn implies_dispatch(&self) -> bool {
		matches!(
			self,
			OrderStatus::Processing
				| OrderStatus::PickedUpForDelivery
				| OrderStatus::DeliveryFailed
				| OrderStatus::Redelivery
				| OrderStatus::DeliveredSuccessfully
		)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderStatus::Pending => write!(f, "Pending"),
			OrderStatus::DepositPaid => write!(f, "DepositPaid"),
			OrderStatus::InDesign => write!(f, "InDesign"),
			OrderStatus::DesignApproved => write!(f, "DesignApproved"),
			OrderStatus::Processing => write!(f, "Processing"),
			OrderStatus::PickedUpForDelivery => write!(f, "PickedUpForDelivery"),
			OrderStatus::DeliveryFailed => write!(f, "DeliveryFailed"),
			OrderStatus::Redelivery => write!(f, "Redelivery"),
			OrderStatus::DeliveredSuccessfully => write!(f, "DeliveredSuccessfully"),
			OrderStatus::OrderCancelled => write!(f, "OrderCancelled"),
		}
	}
}

/// An order record as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Product category; selects the applicable status catalog.
	pub category: OrderCategory,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Carrier tracking reference, set once shipping begins.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub carrier_ref: Option<String>,
	/// Timestamp when this order was created (unix seconds).
	pub created_at: u64,
	/// Timestamp when this order was last updated (unix seconds).
	pub updated_at: u64,
}

/// Filter for listing orders from the store.
///
/// Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderFilter {
	/// Restrict to a single category.
	pub category: Option<OrderCategory>,
	/// Restrict to a single status.
	pub status: Option<OrderStatus>,
}

impl OrderFilter {
	/// Whether the given order matches this filter.
	pub fn matches(&self, order: &Order) -> bool {
		if let Some(category) = self.category {
			if order.category != category {
				return false;
			}
		}
		if let Some(status) = self.status {
			if order.status != status {
				return false;
			}
		}
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn order(category: OrderCategory, status: OrderStatus) -> Order {
		Order {
			id: "ord-1".to_string(),
			category,
			status,
			carrier_ref: None,
			created_at: 0,
			updated_at: 0,
		}
	}

	#[test]
	fn dispatch_statuses_require_carrier_ref() {
		assert!(!OrderStatus::Pending.implies_dispatch());
		assert!(!OrderStatus::DepositPaid.implies_dispatch());
		assert!(!OrderStatus::InDesign.implies_dispatch());
		assert!(!OrderStatus::DesignApproved.implies_dispatch());
		assert!(!OrderStatus::OrderCancelled.implies_dispatch());
		assert!(OrderStatus::Processing.implies_dispatch());
		assert!(OrderStatus::PickedUpForDelivery.implies_dispatch());
		assert!(OrderStatus::DeliveryFailed.implies_dispatch());
		assert!(OrderStatus::Redelivery.implies_dispatch());
		assert!(OrderStatus::DeliveredSuccessfully.implies_dispatch());
	}

	#[test]
	fn empty_filter_matches_everything() {
		let filter = OrderFilter::default();
		assert!(filter.matches(&order(OrderCategory::Template, OrderStatus::Pending)));
		assert!(filter.matches(&order(
			OrderCategory::NewDesign,
			OrderStatus::DeliveredSuccessfully
		)));
	}

	#[test]
	fn filter_restricts_by_category_and_status() {
		let filter = OrderFilter {
			category: Some(OrderCategory::Template),
			status: Some(OrderStatus::Processing),
		};
		assert!(filter.matches(&order(OrderCategory::Template, OrderStatus::Processing)));
		assert!(!filter.matches(&order(OrderCategory::NewDesign, OrderStatus::Processing)));
		assert!(!filter.matches(&order(OrderCategory::Template, OrderStatus::Pending)));
	}
}
