//! Carrier status mapping.
//!
//! Pure translation from the carrier's vocabulary to internal status
//! codes. The carrier vocabulary is a closed, finite set; the mapping
//! is declared here, not inferred. Anything outside the declared set,
//! including case variants and the empty string, maps to `None`, and
//! an unrecognized carrier state must never trigger a transition.

use tracker_types::OrderStatus;

/// Translates a raw carrier status code into an internal status.
///
/// Returns `None` for unrecognized codes (fails soft).
pub fn map_carrier_status(raw: &str) -> Option<OrderStatus> {
	match raw {
		"ready_to_pick" => Some(OrderStatus::Processing),
		"delivering" => Some(OrderStatus::PickedUpForDelivery),
		"delivery_fail" => Some(OrderStatus::DeliveryFailed),
		"return" => Some(OrderStatus::Redelivery),
		"delivered" => Some(OrderStatus::DeliveredSuccessfully),
		"cancel" => Some(OrderStatus::OrderCancelled),
		_ => None,
	}
}
