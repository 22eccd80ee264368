//! Errors raised by store operations.
use thiserror::Error;

use crate::store::ValueKind;

/// A failed store operation.
///
/// Every failure is raised synchronously to the immediate caller; nothing is
/// retried or recovered internally.
#[derive(Debug, Error)]
pub enum StoreError {
    /// [`create`](crate::store::Store::create) was called with a key that is
    /// already present.
    #[error("\"{0}\" already exists in store, maybe you want to update it instead?")]
    DuplicateKey(String),

    /// An operation that requires an existing key was called with an absent
    /// one.
    #[error("\"{0}\" does not exist in store, maybe create it first?")]
    MissingKey(String),

    /// An update's value is incompatible with the shape of the current value.
    #[error("type mismatch: cannot update \"{name}\" with a different type, received {received}, expected {expected}")]
    TypeMismatch {
        /// The key being updated.
        name: String,
        /// The shape of the incoming value.
        received: ValueKind,
        /// The shape of the value already stored.
        expected: ValueKind,
    },

    /// [`unsubscribe`](crate::store::Store::unsubscribe) was called for a key
    /// that has no subscriber list.
    #[error("subscription to \"{0}\" not found")]
    NoSubscription(String),
}
