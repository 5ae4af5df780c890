//! Transition guard: the single gate for order status mutation.
//!
//! Every status change request, whether it came from a carrier report
//! or anywhere else, passes through [`TransitionGuard`] before the
//! store is touched. The guard is a synchronous, side-effect-free
//! decision function over the status catalogs; persistence stays the
//! caller's responsibility, which keeps the guard trivially testable.

use crate::catalog;
use thiserror::Error;
use tracker_types::{Order, OrderCategory, OrderStatus};

/// Accepted outcomes of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
	/// The transition is legal; the caller is authorized to persist
	/// the new status (forwarding the carrier reference when the new
	/// status implies dispatch).
	Applied,
	/// The proposed status equals the current one; the caller must not
	/// re-persist or re-notify.
	NoOp,
}

/// Rejected outcomes of a transition request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
	/// A status code absent from the category's catalog. Programmer
	/// error or corrupt data; never expected in production records.
	#[error("Status {status} is unknown in the {category} catalog")]
	UnknownStatus {
		category: OrderCategory,
		status: OrderStatus,
	},
	/// The order already reached a terminal status; the caller must
	/// stop polling this order.
	#[error("Order is already terminal at {status}")]
	AlreadyTerminal { status: OrderStatus },
	/// The move is not an edge of the category's transition graph.
	/// Expected under carrier flakiness; silently ignored by callers.
	#[error("Illegal transition from {from} to {to}")]
	IllegalTransition { from: OrderStatus, to: OrderStatus },
}

/// The transition gate.
pub struct TransitionGuard;

impl TransitionGuard {
	/// Validates a requested transition against the current state and
	/// the category's transition graph.
	///
	/// Pure and idempotent: repeated identical calls observe no side
	/// effect. An `UnknownStatus` result is loudly logged here because
	/// it signals corrupt data rather than carrier noise.
	pub fn request_transition(
		order: &Order,
		proposed: OrderStatus,
	) -> Result<TransitionOutcome, TransitionError> {
		let category = order.category;

		for status in [order.status, proposed] {
			if !catalog::is_member(category, status) {
				tracing::error!(
					order_id = %order.id,
					category = %category,
					status = %status,
					"Status outside the category catalog"
				);
				return Err(TransitionError::UnknownStatus { category, status });
			}
		}

		if proposed == order.status {
			return Ok(TransitionOutcome::NoOp);
		}

		if catalog::is_terminal(category, order.status) {
			return Err(TransitionError::AlreadyTerminal {
				status: order.status,
			});
		}

		if !catalog::is_reachable(category, order.status, proposed) {
			return Err(TransitionError::IllegalTransition {
				from: order.status,
				to: proposed,
			});
		}

		Ok(TransitionOutcome::Applied)
	}
}
