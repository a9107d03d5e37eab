//! Shared bridge file exchange for the fire-rate bridge.
//!
//! An external memory editor polls a small text file for the values it should
//! apply. Two writers exist:
//!
//! - the controller publishes a single numeric value through
//!   [`AtomicValueFile`] (temp file plus rename, so readers never see a torn
//!   write);
//! - the manual override layer keeps several `name = value` records in a
//!   [`BridgeStore`], rewriting the file in place with bounded retries while
//!   the consumer holds it open.
//!
//! Consistency is last-writer-wins. Nothing here coordinates across processes
//! beyond retrying on sharing violations.

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod error;
pub mod feature;
pub mod paths;
pub mod publisher;
pub mod store;

pub use error::BridgeError;
pub use feature::{
    BridgeValues, ENEMY_MULTIPLIER, FIRERATE, FeatureSpec, RetryPolicy, default_features,
};
pub use paths::{
    STORE_FILE_NAME, VALUE_FILE_NAME, default_exchange_dir, default_store_file, default_value_file,
};
pub use publisher::{AtomicValueFile, PublishOutcome, ValuePublisher, format_value, read_value};
pub use store::BridgeStore;
