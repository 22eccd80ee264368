//! Objects whose properties notify watchers on every write.
//!
//! An [`Observed`] is constructed intentionally rather than retrofitted onto
//! arbitrary data: it owns its property map and its watcher registry, and it
//! is identified by a unique [`ObservedId`] token rather than by anything
//! derived from its contents. Clones share the same instance, so a given
//! object can never be "wrapped" twice.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, Weak,
    },
};

use serde_json::{Map, Value};

static NEXT_OBSERVED_ID: AtomicU64 = AtomicU64::new(0);

/// A unique token identifying one [`Observed`] instance.
///
/// Issued from a process-wide counter at construction. Two observed objects
/// never share an id, no matter how alike their contents are.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObservedId(u64);

type Watcher = Box<dyn FnMut() + Send>;

#[derive(Default)]
struct Watchers {
    next_k: u64,
    by_key: HashMap<String, Vec<(u64, Watcher)>>,
    // disposals that arrived while a key's list was detached for
    // notification; applied when the list is restored
    detached_removals: Vec<(String, u64)>,
}

struct Inner {
    id: ObservedId,
    props: Mutex<Map<String, Value>>,
    watchers: Mutex<Watchers>,
}

/// A shared object whose properties are individually observable.
///
/// Cloning is cheap and shares the underlying instance; a write through any
/// clone notifies watchers registered through every clone.
pub struct Observed {
    inner: Arc<Inner>,
}

impl Clone for Observed {
    fn clone(&self) -> Self {
        Observed {
            inner: self.inner.clone(),
        }
    }
}

impl Default for Observed {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Map<String, Value>> for Observed {
    fn from(props: Map<String, Value>) -> Observed {
        Observed {
            inner: Arc::new(Inner {
                id: ObservedId(NEXT_OBSERVED_ID.fetch_add(1, Ordering::SeqCst)),
                props: Mutex::new(props),
                watchers: Mutex::new(Watchers::default()),
            }),
        }
    }
}

impl Observed {
    /// Create an empty observed object.
    pub fn new() -> Observed {
        Observed::from(Map::new())
    }

    /// This instance's unique token.
    pub fn id(&self) -> ObservedId {
        self.inner.id
    }

    /// Read a property, cloning its current value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.props.lock().unwrap().get(key).cloned()
    }

    /// Visit a property by reference.
    pub fn visit<F, A>(&self, key: &str, f: F) -> A
    where
        F: FnOnce(Option<&Value>) -> A,
    {
        f(self.inner.props.lock().unwrap().get(key))
    }

    /// A plain-data copy of every property.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner.props.lock().unwrap().clone()
    }

    /// Write a property, then run every watcher registered for that key,
    /// synchronously and in registration order.
    ///
    /// Watchers receive no payload; they re-read whatever state they care
    /// about themselves. Keys that did not exist at construction are written
    /// and observed like any other. The watcher registry is not locked while
    /// watchers run, so a watcher may read and write this object, register
    /// new watchers, or dispose observations, including its own.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        {
            let mut props = self.inner.props.lock().unwrap();
            props.insert(key.clone(), value);
        }
        // the key's list is detached while its watchers run and restored
        // afterwards, with any disposals and registrations made in between
        // applied to it
        let detached = self.inner.watchers.lock().unwrap().by_key.remove(&key);
        if let Some(mut list) = detached {
            for (_, watch) in list.iter_mut() {
                watch();
            }

            let mut watchers = self.inner.watchers.lock().unwrap();
            let removed: Vec<u64> = watchers
                .detached_removals
                .iter()
                .filter(|(removed_key, _)| *removed_key == key)
                .map(|(_, k)| *k)
                .collect();
            watchers
                .detached_removals
                .retain(|(removed_key, _)| *removed_key != key);
            list.retain(|(k, _)| !removed.contains(k));

            // watchers registered during notification follow the originals
            let restored = watchers.by_key.entry(key).or_default();
            list.append(restored);
            *restored = list;
        }
    }

    /// Register a watcher for one property.
    ///
    /// The watcher stays registered for as long as the returned
    /// [`Observation`] is alive; dropping it removes the watcher.
    pub fn observe(
        &self,
        key: impl Into<String>,
        callback: impl FnMut() + Send + 'static,
    ) -> Observation {
        let key = key.into();
        let mut watchers = self.inner.watchers.lock().unwrap();
        let k = watchers.next_k;
        watchers.next_k += 1;
        watchers
            .by_key
            .entry(key.clone())
            .or_default()
            .push((k, Box::new(callback)));
        Observation {
            key,
            k,
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Keeps a property watcher registered.
///
/// Dropping the observation removes the watcher from its [`Observed`]. It
/// holds only a weak handle, so an observation never keeps the object itself
/// alive.
pub struct Observation {
    key: String,
    k: u64,
    inner: Weak<Inner>,
}

impl Observation {
    /// Remove the watcher now. Equivalent to dropping.
    pub fn dispose(self) {}
}

impl Drop for Observation {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut watchers = inner.watchers.lock().unwrap();
            if let Some(list) = watchers.by_key.get_mut(&self.key) {
                list.retain(|(k, _)| *k != self.k);
            } else {
                // the list is detached for a notification in progress
                watchers
                    .detached_removals
                    .push((self.key.clone(), self.k));
            }
        }
    }
}
