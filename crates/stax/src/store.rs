//! A named collection of values that can be shared between components.
//!
//! A [`Store`] maps string names to [`Value`]s and lets callers subscribe to
//! changes of individual entries. Every mutating operation documents whether
//! it notifies subscribers; those that do run every callback inline, in
//! registration order, with the post-mutation value, before returning.
use std::collections::HashMap;

use log::{debug, trace};
use serde_json::Value;

use crate::error::StoreError;

/// The shape class of a [`Value`], used for update compatibility checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// The kind of the given value.
    pub fn of(value: &Value) -> ValueKind {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Whether values of this kind update by direct replacement rather than
    /// by merging.
    pub fn is_primitive(self) -> bool {
        !matches!(self, ValueKind::Array | ValueKind::Object)
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        })
    }
}

/// Identifies one subscriber of one store entry.
///
/// Handed out by [`Store::subscribe`]. Closures cannot be compared for
/// identity, so removal goes through this token instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Subscriber = Box<dyn FnMut(&Value)>;

/// A key-value store with per-entry subscriptions.
///
/// Presence of a key is decided by key membership alone. Any [`Value`] is a
/// valid entry, including `null`, `false`, `0` and `""`.
#[derive(Default)]
pub struct Store {
    entries: HashMap<String, Value>,
    subscribers: HashMap<String, Vec<(SubscriberId, Subscriber)>>,
    next_id: u64,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Store {
        Default::default()
    }

    /// Create a store seeded with the given entries.
    ///
    /// Seeding is not a mutation; no subscribers can exist yet and none are
    /// notified.
    pub fn with_state<I>(state: I) -> Store
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        Store {
            entries: state.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Add a new entry. Does not notify.
    pub fn create(&mut self, name: impl Into<String>, value: Value) -> Result<(), StoreError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(StoreError::DuplicateKey(name));
        }
        trace!("store: create {:?} = {}", name, value);
        self.entries.insert(name, value);
        Ok(())
    }

    /// Merge a value into an existing entry and notify its subscribers.
    ///
    /// The merge policy follows the shapes of the two values:
    ///
    /// * array into array: the new elements are appended, duplicates kept;
    /// * object into object: shallow merge, new keys win on collision;
    /// * primitive onto primitive: direct replacement (the two primitives
    ///   need not be the same kind);
    /// * anything else is a [`StoreError::TypeMismatch`].
    ///
    /// On success every subscriber for `name` runs with the merged value, in
    /// registration order, and the merged value is returned.
    pub fn update(&mut self, name: &str, value: Value) -> Result<Value, StoreError> {
        let current = self
            .entries
            .get_mut(name)
            .ok_or_else(|| StoreError::MissingKey(name.to_string()))?;
        let expected = ValueKind::of(current);
        let received = ValueKind::of(&value);
        trace!("store: update {:?}, {} into {}", name, received, expected);

        match (current, value) {
            (Value::Array(current), Value::Array(mut new)) => current.append(&mut new),
            (Value::Object(current), Value::Object(new)) => {
                for (key, value) in new {
                    current.insert(key, value);
                }
            }
            (current, new) if expected.is_primitive() && received.is_primitive() => *current = new,
            _ => {
                return Err(StoreError::TypeMismatch {
                    name: name.to_string(),
                    received,
                    expected,
                })
            }
        }

        self.notify(name);
        Ok(self.entries[name].clone())
    }

    /// Replace an entry wholesale and notify its subscribers.
    ///
    /// Unlike [`update`](Store::update) nothing is merged, but the new value
    /// must be the same [`ValueKind`] as the current one. On success every
    /// subscriber for `name` runs with the new value, in registration order,
    /// and the new value is returned.
    pub fn flush_update(&mut self, name: &str, value: Value) -> Result<Value, StoreError> {
        let current = self
            .entries
            .get_mut(name)
            .ok_or_else(|| StoreError::MissingKey(name.to_string()))?;
        let expected = ValueKind::of(current);
        let received = ValueKind::of(&value);
        if received != expected {
            return Err(StoreError::TypeMismatch {
                name: name.to_string(),
                received,
                expected,
            });
        }
        *current = value;
        self.notify(name);
        Ok(self.entries[name].clone())
    }

    /// Register a callback to run whenever the named entry changes.
    ///
    /// Callbacks run in registration order and receive the post-mutation
    /// value. The returned id is the handle for
    /// [`unsubscribe`](Store::unsubscribe); the store keeps the callback
    /// alive until then.
    pub fn subscribe(
        &mut self,
        name: &str,
        callback: impl FnMut(&Value) + 'static,
    ) -> Result<SubscriberId, StoreError> {
        if !self.entries.contains_key(name) {
            return Err(StoreError::MissingKey(name.to_string()));
        }
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers
            .entry(name.to_string())
            .or_default()
            .push((id, Box::new(callback)));
        Ok(id)
    }

    /// Remove a subscriber by id.
    ///
    /// Fails with [`StoreError::MissingKey`] when the entry is absent and
    /// with [`StoreError::NoSubscription`] when the entry has never had a
    /// subscriber list. An id that is not in the list is a no-op.
    pub fn unsubscribe(&mut self, name: &str, id: SubscriberId) -> Result<(), StoreError> {
        if !self.entries.contains_key(name) {
            return Err(StoreError::MissingKey(name.to_string()));
        }
        let subscribers = self
            .subscribers
            .get_mut(name)
            .ok_or_else(|| StoreError::NoSubscription(name.to_string()))?;
        subscribers.retain(|(k, _)| *k != id);
        Ok(())
    }

    /// Read a single entry.
    pub fn get(&self, name: &str) -> Option<&Value> {
        debug!("store: get {:?}", name);
        self.entries.get(name)
    }

    /// The whole mapping of entries.
    ///
    /// The borrow is shared, so entries cannot be mutated behind the store's
    /// back; all mutation goes through the store API and its notifications.
    pub fn state(&self) -> &HashMap<String, Value> {
        &self.entries
    }

    /// Alias for [`state`](Store::state).
    pub fn read(&self) -> &HashMap<String, Value> {
        self.state()
    }

    /// The names of every entry, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Remove an entry and its subscriber list, returning the removed value.
    /// Does not notify.
    pub fn delete(&mut self, name: &str) -> Result<Value, StoreError> {
        let value = self
            .entries
            .remove(name)
            .ok_or_else(|| StoreError::MissingKey(name.to_string()))?;
        self.subscribers.remove(name);
        trace!("store: delete {:?}", name);
        Ok(value)
    }

    /// Drop every entry and every subscriber list. Does not notify.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.subscribers.clear();
    }

    /// Reset an entry to `null` without type checking. Does not notify.
    pub fn flush(&mut self, name: &str) -> Result<(), StoreError> {
        let current = self
            .entries
            .get_mut(name)
            .ok_or_else(|| StoreError::MissingKey(name.to_string()))?;
        *current = Value::Null;
        Ok(())
    }

    fn notify(&mut self, name: &str) {
        let Some(value) = self.entries.get(name).cloned() else {
            return;
        };
        if let Some(subscribers) = self.subscribers.get_mut(name) {
            for (_, callback) in subscribers.iter_mut() {
                callback(&value);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;

    #[test]
    fn create_then_get() {
        let mut store = Store::new();
        store.create("greeting", json!("hello")).unwrap();
        assert_eq!(store.get("greeting"), Some(&json!("hello")));
        assert!(matches!(
            store.create("greeting", json!("again")),
            Err(StoreError::DuplicateKey(_))
        ));
    }

    #[test]
    fn falsy_values_are_real_entries() {
        let mut store = Store::new();
        store.create("zero", json!(0)).unwrap();
        store.create("empty", json!("")).unwrap();
        store.create("no", json!(false)).unwrap();
        store.create("nothing", Value::Null).unwrap();

        assert!(matches!(
            store.create("zero", json!(1)),
            Err(StoreError::DuplicateKey(_))
        ));
        store.delete("empty").unwrap();
        assert_eq!(store.get("empty"), None);
        store.update("no", json!(true)).unwrap();
        assert_eq!(store.get("no"), Some(&json!(true)));
    }

    #[test]
    fn update_concatenates_arrays() {
        let mut store = Store::new();
        store.create("list", json!([1, 2])).unwrap();
        let merged = store.update("list", json!([3, 2])).unwrap();
        assert_eq!(merged, json!([1, 2, 3, 2]));
        assert_eq!(store.get("list"), Some(&json!([1, 2, 3, 2])));
    }

    #[test]
    fn update_merges_objects_shallowly() {
        let mut store = Store::new();
        store
            .create("user", json!({"name": "Ada", "role": "admin"}))
            .unwrap();
        let merged = store
            .update("user", json!({"name": "Grace", "visits": 2}))
            .unwrap();
        assert_eq!(
            merged,
            json!({"name": "Grace", "role": "admin", "visits": 2})
        );
    }

    #[test]
    fn update_replaces_primitives() {
        let mut store = Store::new();
        store.create("count", json!(1)).unwrap();
        store.update("count", json!(2)).unwrap();
        assert_eq!(store.get("count"), Some(&json!(2)));
        // primitives replace across kinds, matching the loose typing of the
        // props that feed the store
        store.update("count", json!("two")).unwrap();
        assert_eq!(store.get("count"), Some(&json!("two")));
    }

    #[test]
    fn update_rejects_shape_changes() {
        let mut store = Store::new();
        store.create("count", json!(1)).unwrap();
        match store.update("count", json!([1])) {
            Err(StoreError::TypeMismatch {
                received, expected, ..
            }) => {
                assert_eq!(received, ValueKind::Array);
                assert_eq!(expected, ValueKind::Number);
            }
            other => panic!("expected type mismatch, got {:?}", other.map(|_| ())),
        }
        assert!(matches!(
            store.update("count", json!({"n": 1})),
            Err(StoreError::TypeMismatch { .. })
        ));
        assert!(matches!(
            store.update("missing", json!(1)),
            Err(StoreError::MissingKey(_))
        ));
    }

    #[test]
    fn flush_update_replaces_without_merging() {
        let mut store = Store::new();
        store.create("user", json!({"name": "Ada", "role": "admin"})).unwrap();
        let new = store.flush_update("user", json!({"name": "Grace"})).unwrap();
        assert_eq!(new, json!({"name": "Grace"}));

        assert!(matches!(
            store.flush_update("user", json!("nope")),
            Err(StoreError::TypeMismatch { .. })
        ));
        assert!(matches!(
            store.flush_update("missing", json!(1)),
            Err(StoreError::MissingKey(_))
        ));
    }

    #[test]
    fn subscribers_run_in_order_with_the_new_value() {
        let mut store = Store::new();
        store.create("count", json!(0)).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_a = seen.clone();
        let a = store
            .subscribe("count", move |value| {
                seen_a.lock().unwrap().push(("a", value.clone()));
            })
            .unwrap();
        let seen_b = seen.clone();
        store
            .subscribe("count", move |value| {
                seen_b.lock().unwrap().push(("b", value.clone()));
            })
            .unwrap();

        store.update("count", json!(1)).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("a", json!(1)), ("b", json!(1))]
        );

        store.unsubscribe("count", a).unwrap();
        store.flush_update("count", json!(2)).unwrap();
        assert_eq!(seen.lock().unwrap().last(), Some(&("b", json!(2))));
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn unsubscribe_requires_a_subscriber_list() {
        let mut store = Store::new();
        store.create("watched", json!(0)).unwrap();
        store.create("lonely", json!(0)).unwrap();
        let id = store.subscribe("watched", |_| {}).unwrap();

        assert!(matches!(
            store.unsubscribe("lonely", id),
            Err(StoreError::NoSubscription(_))
        ));
        assert!(matches!(
            store.unsubscribe("missing", id),
            Err(StoreError::MissingKey(_))
        ));
        store.unsubscribe("watched", id).unwrap();
        // a second removal of the same id is a no-op
        store.unsubscribe("watched", id).unwrap();
    }

    #[test]
    fn delete_purges_subscribers() {
        let mut store = Store::new();
        store.create("temp", json!(1)).unwrap();
        let fired = Arc::new(Mutex::new(0));
        let fired_in = fired.clone();
        store
            .subscribe("temp", move |_| *fired_in.lock().unwrap() += 1)
            .unwrap();

        assert_eq!(store.delete("temp").unwrap(), json!(1));
        assert_eq!(store.get("temp"), None);
        assert!(matches!(
            store.delete("temp"),
            Err(StoreError::MissingKey(_))
        ));

        // recreating the key does not resurrect the old subscriber
        store.create("temp", json!(2)).unwrap();
        store.update("temp", json!(3)).unwrap();
        assert_eq!(*fired.lock().unwrap(), 0);
    }

    #[test]
    fn clear_resets_to_a_fresh_store() {
        let mut store = Store::new();
        store.create("a", json!(1)).unwrap();
        store.subscribe("a", |_| {}).unwrap();
        store.clear();

        assert!(matches!(
            store.update("a", json!(2)),
            Err(StoreError::MissingKey(_))
        ));
        store.create("a", json!(1)).unwrap();
    }

    #[test]
    fn flush_nulls_without_notifying() {
        let mut store = Store::new();
        store.create("count", json!(5)).unwrap();
        let fired = Arc::new(Mutex::new(0));
        let fired_in = fired.clone();
        store
            .subscribe("count", move |_| *fired_in.lock().unwrap() += 1)
            .unwrap();

        store.flush("count").unwrap();
        assert_eq!(store.get("count"), Some(&Value::Null));
        assert_eq!(*fired.lock().unwrap(), 0);
        assert!(matches!(
            store.flush("missing"),
            Err(StoreError::MissingKey(_))
        ));
    }

    #[test]
    fn with_state_seeds_entries() {
        let mut store = Store::with_state(vec![
            ("name".to_string(), json!("Ada")),
            ("visits".to_string(), json!(1)),
        ]);
        assert_eq!(store.get("name"), Some(&json!("Ada")));
        assert!(matches!(
            store.create("visits", json!(0)),
            Err(StoreError::DuplicateKey(_))
        ));
        let mut keys = store.keys().collect::<Vec<_>>();
        keys.sort();
        assert_eq!(keys, vec!["name", "visits"]);
    }
}
