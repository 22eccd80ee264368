//! Declarative element construction over an observable key-value store.
//!
//! `stax` builds UI element trees from declarative props and keeps their text
//! content live against three kinds of data source:
//!
//! * a [`Store`](store::Store) of named values with per-entry subscriptions,
//! * [`Observed`](observe::Observed) objects whose properties notify watchers
//!   on every write,
//! * `&(object.key)` placeholders in text, resolved through a
//!   [`Bindings`](template::Bindings) mapping.
//!
//! All notification is synchronous: a mutation runs every subscriber inline,
//! in registration order, before the mutating call returns. There is no
//! executor and no event loop to cooperate with other than the caller's own.
//!
//! Elements build into a string-renderable node tree rather than a real UI
//! document, which keeps the reactive core testable anywhere:
//!
//! ```rust
//! use stax::prelude::*;
//! use serde_json::json;
//!
//! let user = Observed::new();
//! user.set("name", json!("Ada"));
//!
//! let greeting = ElementBuilder::new("p")
//!     .class("greeting")
//!     .text("Hello &(user.name)!")
//!     .bindings(Bindings::new().with("user", user.clone()))
//!     .build();
//! assert_eq!(greeting.text_content(), "Hello Ada!");
//!
//! user.set("name", json!("Grace"));
//! assert_eq!(greeting.text_content(), "Hello Grace!");
//! ```

pub mod builder;
pub mod error;
pub mod node;
pub mod observe;
pub mod prelude;
pub mod store;
pub mod template;
