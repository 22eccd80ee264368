//! `&(object.key)` placeholder templates.
//!
//! A placeholder names a binding on its left and a property of the bound
//! object on its right. Resolution is pure: the same template and the same
//! bindings always produce the same text, and a missing binding renders as
//! the empty string rather than an error.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::{
    error::StoreError,
    observe::Observed,
    store::{Store, SubscriberId},
};

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"&\(([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\)").unwrap();
}

/// Render a bound value as display text. Strings render bare, everything
/// else renders as its JSON form.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The `(binding, key)` identifier pairs of every placeholder in `template`,
/// in order of appearance.
pub(crate) fn placeholders(template: &str) -> Vec<(String, String)> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// Substitute every placeholder in `template` from `bindings`.
///
/// Each `&(a.b)` is replaced with the display form of `bindings["a"]["b"]`,
/// or with the empty string when either lookup misses. A template with no
/// placeholders comes back unchanged.
pub fn resolve(template: &str, bindings: &Map<String, Value>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            bindings
                .get(&caps[1])
                .and_then(|bound| bound.get(&caps[2]))
                .map(display)
                .unwrap_or_default()
        })
        .into_owned()
}

/// Named [`Observed`] objects available to a template.
#[derive(Clone, Default)]
pub struct Bindings {
    bound: HashMap<String, Observed>,
}

impl Bindings {
    /// Create an empty mapping.
    pub fn new() -> Bindings {
        Default::default()
    }

    /// Bind `name` to the given object, builder style.
    pub fn with(mut self, name: impl Into<String>, object: Observed) -> Bindings {
        self.insert(name, object);
        self
    }

    /// Bind `name` to the given object.
    pub fn insert(&mut self, name: impl Into<String>, object: Observed) {
        self.bound.insert(name.into(), object);
    }

    /// Look up a bound object.
    pub fn get(&self, name: &str) -> Option<&Observed> {
        self.bound.get(name)
    }

    /// A plain-data view of every bound object, suitable for [`resolve`].
    pub fn snapshot(&self) -> Map<String, Value> {
        self.bound
            .iter()
            .map(|(name, object)| (name.clone(), Value::Object(object.snapshot())))
            .collect()
    }
}

/// Keep a resolved template live against store entries.
///
/// For every placeholder whose binding name is present in `bindings`, one
/// store subscription is registered under that same name - one per
/// placeholder occurrence, so a name appearing twice subscribes twice and
/// `on_resolved` runs twice per update. Resolution is pure, so the duplicate
/// invocations carry identical text.
///
/// On each notification the delivered value replaces that name's binding and
/// the re-resolved text is passed to `on_resolved`. The returned ids belong
/// to the caller; the store keeps the subscriptions until they are
/// explicitly removed.
///
/// When a bound placeholder names an entry the store does not have, the call
/// fails with [`StoreError::MissingKey`] before registering anything.
pub fn bind_to_store(
    template: &str,
    bindings: Map<String, Value>,
    store: &mut Store,
    on_resolved: impl FnMut(String) + 'static,
) -> Result<Vec<SubscriberId>, StoreError> {
    let pairs = placeholders(template);
    // every bound name must exist up front: a partial registration would
    // leave subscriptions in the store with no id to unsubscribe by
    for (name, _) in &pairs {
        if bindings.contains_key(name) && !store.state().contains_key(name) {
            return Err(StoreError::MissingKey(name.clone()));
        }
    }

    let template: Arc<str> = Arc::from(template);
    let bindings = Arc::new(Mutex::new(bindings));
    let on_resolved = Arc::new(Mutex::new(on_resolved));

    let mut ids = Vec::new();
    for (name, _) in pairs {
        if !bindings.lock().unwrap().contains_key(&name) {
            continue;
        }
        let template = Arc::clone(&template);
        let bindings = Arc::clone(&bindings);
        let on_resolved = Arc::clone(&on_resolved);
        let bound_name = name.clone();
        ids.push(store.subscribe(&name, move |value| {
            let text = {
                let mut bound = bindings.lock().unwrap();
                bound.insert(bound_name.clone(), value.clone());
                resolve(&template, &bound)
            };
            (on_resolved.lock().unwrap())(text);
        })?);
    }
    Ok(ids)
}
