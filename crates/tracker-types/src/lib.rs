//! Common types module for the order tracker.
//!
//! This module defines the core data types shared by every tracker
//! component. It provides a centralized location for the order domain
//! model and the event vocabulary to ensure consistency across crates.

/// Event types for push notifications and engine-internal signals.
pub mod events;
/// Order domain types: categories, statuses, filters.
pub mod order;

// Re-export all types for convenient access
pub use events::*;
pub use order::*;
