//! Status catalogs: the authoritative per-category lifecycle tables.
//!
//! One declarative table per order category holds the member statuses,
//! their display ordinals, the terminal set, and the directed
//! transition edges. The tables are configuration, not computed state:
//! they are built once at first use and queried through pure lookups.
//! Transition legality is decided only by the edge set; ordinals exist
//! for progress display and carry no legality meaning (failure/retry
//! branches are lateral).

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracker_types::{OrderCategory, OrderStatus};

/// Errors that can occur during catalog lookups.
///
/// An unknown status is a programmer error or corrupt data; it should
/// never occur in production records and is logged loudly by callers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
	#[error("Status {status} is not a member of the {category} catalog")]
	UnknownStatus {
		category: OrderCategory,
		status: OrderStatus,
	},
}

/// Lifecycle table for one order category.
struct CategoryCatalog {
	/// Member statuses mapped to their display ordinal.
	ordinals: HashMap<OrderStatus, u8>,
	/// Statuses from which no further transition is permitted.
	terminal: HashSet<OrderStatus>,
	/// Directed transition edges. Self-loops are never declared; a
	/// requested transition to the current status is a no-op upstream.
	edges: HashSet<(OrderStatus, OrderStatus)>,
}

/// Delivery tail shared by every category, in ordinal order.
const DELIVERY_TAIL: [OrderStatus; 5] = [
	OrderStatus::PickedUpForDelivery,
	OrderStatus::DeliveryFailed,
	OrderStatus::Redelivery,
	OrderStatus::DeliveredSuccessfully,
	OrderStatus::OrderCancelled,
];

/// Builds the catalog for a category from its pre-dispatch head.
///
/// The head runs from `Pending` up to and including `Processing`; the
/// delivery tail and the cancellation edges are identical across
/// categories.
fn build_catalog(head: &[OrderStatus]) -> CategoryCatalog {
	let mut ordinals = HashMap::new();
	let mut edges = HashSet::new();

	let members: Vec<OrderStatus> = head.iter().chain(DELIVERY_TAIL.iter()).copied().collect();
	for (ordinal, status) in members.iter().enumerate() {
		ordinals.insert(*status, ordinal as u8);
	}

	// Linear pre-dispatch head: each step reaches the next.
	for pair in head.windows(2) {
		edges.insert((pair[0], pair[1]));
	}

	// Delivery tail, including the lateral failure/retry branches.
	edges.insert((OrderStatus::Processing, OrderStatus::PickedUpForDelivery));
	edges.insert((
		OrderStatus::PickedUpForDelivery,
		OrderStatus::DeliveredSuccessfully,
	));
	edges.insert((OrderStatus::PickedUpForDelivery, OrderStatus::DeliveryFailed));
	edges.insert((OrderStatus::PickedUpForDelivery, OrderStatus::Redelivery));
	edges.insert((OrderStatus::DeliveryFailed, OrderStatus::Redelivery));
	edges.insert((OrderStatus::Redelivery, OrderStatus::DeliveredSuccessfully));
	edges.insert((OrderStatus::Redelivery, OrderStatus::DeliveryFailed));

	let terminal = HashSet::from([
		OrderStatus::DeliveredSuccessfully,
		OrderStatus::OrderCancelled,
	]);

	// Cancellation is reachable from every non-terminal member.
	for status in &members {
		if !terminal.contains(status) {
			edges.insert((*status, OrderStatus::OrderCancelled));
		}
	}

	CategoryCatalog {
		ordinals,
		terminal,
		edges,
	}
}

/// The per-category catalogs, built once at process start.
static CATALOGS: Lazy<HashMap<OrderCategory, CategoryCatalog>> = Lazy::new(|| {
	HashMap::from([
		(
			OrderCategory::Template,
			build_catalog(&[OrderStatus::Pending, OrderStatus::Processing]),
		),
		(
			OrderCategory::CustomTemplate,
			build_catalog(&[
				OrderStatus::Pending,
				OrderStatus::DepositPaid,
				OrderStatus::Processing,
			]),
		),
		(
			OrderCategory::NewDesign,
			build_catalog(&[
				OrderStatus::Pending,
				OrderStatus::DepositPaid,
				OrderStatus::InDesign,
				OrderStatus::DesignApproved,
				OrderStatus::Processing,
			]),
		),
	])
});

fn catalog(category: OrderCategory) -> &'static CategoryCatalog {
	// Every category variant is present in the static table.
	&CATALOGS[&category]
}

/// Whether `status` is a member of `category`'s catalog.
pub fn is_member(category: OrderCategory, status: OrderStatus) -> bool {
	catalog(category).ordinals.contains_key(&status)
}

/// Display ordinal of `status` within `category`'s catalog.
///
/// Used only to render progress; transition legality is decided by
/// [`is_reachable`].
pub fn ordinal_of(category: OrderCategory, status: OrderStatus) -> Result<u8, CatalogError> {
	catalog(category)
		.ordinals
		.get(&status)
		.copied()
		.ok_or(CatalogError::UnknownStatus { category, status })
}

/// Whether `status` is terminal for `category`.
///
/// No transition leaves a terminal status, and no polling continues
/// past one.
pub fn is_terminal(category: OrderCategory, status: OrderStatus) -> bool {
	catalog(category).terminal.contains(&status)
}

/// Whether `to` is reachable from `from` for `category`.
///
/// True iff `(from, to)` is a declared edge, or `from == to` (a no-op
/// transition is always allowed).
pub fn is_reachable(category: OrderCategory, from: OrderStatus, to: OrderStatus) -> bool {
	from == to || catalog(category).edges.contains(&(from, to))
}

/// All member statuses of `category`, in ordinal order.
pub fn members(category: OrderCategory) -> Vec<OrderStatus> {
	let table = catalog(category);
	let mut members: Vec<OrderStatus> = table.ordinals.keys().copied().collect();
	members.sort_by_key(|s| table.ordinals[s]);
	members
}

#[cfg(test)]
mod tests {
	use super::*;

	const ALL_CATEGORIES: [OrderCategory; 3] = [
		OrderCategory::Template,
		OrderCategory::CustomTemplate,
		OrderCategory::NewDesign,
	];

	#[test]
	fn self_transition_is_always_reachable() {
		for category in ALL_CATEGORIES {
			for status in members(category) {
				assert!(
					is_reachable(category, status, status),
					"{category}: {status} -> {status} should be a legal no-op"
				);
			}
		}
	}

	#[test]
	fn terminal_statuses_have_no_outgoing_edges() {
		for category in ALL_CATEGORIES {
			for status in members(category) {
				if !is_terminal(category, status) {
					continue;
				}
				for other in members(category) {
					if other != status {
						assert!(
							!is_reachable(category, status, other),
							"{category}: terminal {status} must not reach {other}"
						);
					}
				}
			}
		}
	}

	#[test]
	fn ordinals_are_unique_and_dense() {
		for category in ALL_CATEGORIES {
			let members = members(category);
			for (expected, status) in members.iter().enumerate() {
				assert_eq!(ordinal_of(category, *status).unwrap(), expected as u8);
			}
		}
	}

	#[test]
	fn ordinal_of_unknown_status_fails() {
		let err = ordinal_of(OrderCategory::Template, OrderStatus::InDesign).unwrap_err();
		assert_eq!(
			err,
			CatalogError::UnknownStatus {
				category: OrderCategory::Template,
				status: OrderStatus::InDesign,
			}
		);
	}

	#[test]
	fn edge_endpoints_are_members() {
		for category in ALL_CATEGORIES {
			for (from, to) in &catalog(category).edges {
				assert!(is_member(category, *from), "{category}: {from} not a member");
				assert!(is_member(category, *to), "{category}: {to} not a member");
				assert_ne!(from, to, "{category}: self-loop declared for {from}");
			}
		}
	}

	#[test]
	fn delivery_fail_precedes_redelivery_in_every_category() {
		for category in ALL_CATEGORIES {
			let fail = ordinal_of(category, OrderStatus::DeliveryFailed).unwrap();
			let redelivery = ordinal_of(category, OrderStatus::Redelivery).unwrap();
			assert!(fail < redelivery);
		}
	}

	#[test]
	fn redelivery_has_multiple_predecessors() {
		for category in ALL_CATEGORIES {
			assert!(is_reachable(
				category,
				OrderStatus::DeliveryFailed,
				OrderStatus::Redelivery
			));
			assert!(is_reachable(
				category,
				OrderStatus::PickedUpForDelivery,
				OrderStatus::Redelivery
			));
		}
	}

	#[test]
	fn design_states_belong_only_to_new_design() {
		assert!(is_member(OrderCategory::NewDesign, OrderStatus::InDesign));
		assert!(is_member(OrderCategory::NewDesign, OrderStatus::DesignApproved));
		assert!(!is_member(OrderCategory::Template, OrderStatus::InDesign));
		assert!(!is_member(OrderCategory::Template, OrderStatus::DepositPaid));
		assert!(!is_member(OrderCategory::CustomTemplate, OrderStatus::InDesign));
		assert!(is_member(OrderCategory::CustomTemplate, OrderStatus::DepositPaid));
	}

	#[test]
	fn cancellation_is_reachable_from_every_non_terminal() {
		for category in ALL_CATEGORIES {
			for status in members(category) {
				if is_terminal(category, status) {
					continue;
				}
				assert!(
					is_reachable(category, status, OrderStatus::OrderCancelled),
					"{category}: {status} should reach OrderCancelled"
				);
			}
		}
	}

	#[test]
	fn head_is_linear_and_skipping_is_illegal() {
		// NewDesign must pass through design approval before production.
		assert!(is_reachable(
			OrderCategory::NewDesign,
			OrderStatus::InDesign,
			OrderStatus::DesignApproved
		));
		assert!(!is_reachable(
			OrderCategory::NewDesign,
			OrderStatus::Pending,
			OrderStatus::Processing
		));
		// Template has no deposit gate.
		assert!(is_reachable(
			OrderCategory::Template,
			OrderStatus::Pending,
			OrderStatus::Processing
		));
	}

	#[test]
	fn backward_moves_are_illegal() {
		for category in ALL_CATEGORIES {
			assert!(!is_reachable(
				category,
				OrderStatus::PickedUpForDelivery,
				OrderStatus::Processing
			));
			assert!(!is_reachable(
				category,
				OrderStatus::DeliveredSuccessfully,
				OrderStatus::PickedUpForDelivery
			));
		}
	}
}
