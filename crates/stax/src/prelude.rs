//! Re-exports of everything needed to build reactive elements.
pub use crate::{
    builder::{Element, ElementBuilder},
    error::StoreError,
    node::ViewNode,
    observe::{Observation, Observed, ObservedId},
    store::{Store, SubscriberId, ValueKind},
    template::{bind_to_store, resolve, Bindings},
};
