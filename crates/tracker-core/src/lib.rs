//! Core order-status reconciliation engine.
//!
//! This crate keeps a locally-held order status synchronized with the
//! shipping carrier's tracking state (by polling) and with the push
//! notification stream (by debounced collection refreshes), while
//! guaranteeing that status only moves forward through the per-category
//! lifecycle graph and that redundant or stale updates never corrupt
//! the record.
//!
//! The pieces, leaves first: [`catalog`] owns the per-category status
//! graphs; [`mapper`] translates carrier vocabulary; [`state`] gates
//! every mutation; [`reconcile`] runs the per-order poll loop;
//! [`refresh`] coalesces push events; [`engine`] wires it all together
//! behind the public session/listener surface.

/// Per-category status membership, ordinals, and transition edges.
pub mod catalog;
/// The engine facade: sessions, listeners, event bus, run loop.
pub mod engine;
/// Carrier vocabulary translation.
pub mod mapper;
/// Per-order carrier reconciliation poller.
pub mod reconcile;
/// Debounced push-event refresh for collection views.
pub mod refresh;
/// Transition guard: the single gate for status mutation.
pub mod state;

pub use catalog::CatalogError;
pub use engine::{event_bus::EventBus, EngineError, ListenerHandle, SessionHandle, TrackerEngine};
pub use mapper::map_carrier_status;
pub use refresh::{RefreshError, RefreshFn};
pub use state::{TransitionError, TransitionGuard, TransitionOutcome};
