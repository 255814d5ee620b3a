//! Race-safe async data loading.
//!
//! A [`Resource`] wraps a producer (usually a call through
//! [`ApiClient`](crate::fetch::ApiClient)) and publishes [`LoadState`]
//! transitions to its subscribers.

mod resource;
mod state;

pub use resource::{BoxFuture, Resource};
pub use state::{LoadState, Settlement, Snapshot};
