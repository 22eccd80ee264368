//! Declarative element construction.
//!
//! An [`ElementBuilder`] consumes props one call at a time and produces an
//! [`Element`] whose text content stays live against whatever data sources
//! the props named: `&(a.b)` placeholders over a [`Bindings`] mapping, a
//! direct [`Observed`] property binding, or a store entry.
use std::sync::{Arc, Mutex};

use log::{trace, warn};

use crate::{
    error::StoreError,
    node::ViewNode,
    observe::{Observation, Observed},
    store::{Store, SubscriberId},
    template::{self, Bindings},
};

struct ElementInner {
    tag: String,
    attributes: Vec<(String, Option<String>)>,
    text: Mutex<Option<String>>,
    children: Vec<Element>,
}

impl ElementInner {
    fn set_text(&self, text: String) {
        *self.text.lock().unwrap() = Some(text);
    }
}

/// A built element.
///
/// The element owns the property observations its props demanded; dropping
/// the element removes those watchers. Store subscriptions cannot be removed
/// without the store itself, so their ids are recorded and exposed through
/// [`store_subscriptions`](Element::store_subscriptions) for the caller to
/// release.
pub struct Element {
    inner: Arc<ElementInner>,
    observations: Vec<Observation>,
    store_subscriptions: Vec<(String, SubscriberId)>,
}

impl Element {
    /// The element's tag name.
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    /// The element's own text followed by the text of its children.
    pub fn text_content(&self) -> String {
        let mut text = self.inner.text.lock().unwrap().clone().unwrap_or_default();
        for child in &self.inner.children {
            text.push_str(&child.text_content());
        }
        text
    }

    /// Overwrite the element's own text. Children are untouched.
    pub fn set_text_content(&self, text: impl Into<String>) {
        self.inner.set_text(text.into());
    }

    /// The number of live property observations held by this element.
    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    /// The store subscriptions registered by
    /// [`build_with`](ElementBuilder::build_with), as `(entry, id)` pairs.
    pub fn store_subscriptions(&self) -> &[(String, SubscriberId)] {
        &self.store_subscriptions
    }

    /// Snapshot this element and its children as a [`ViewNode`] tree.
    pub fn to_node(&self) -> ViewNode {
        let mut children = Vec::new();
        if let Some(text) = self.inner.text.lock().unwrap().clone() {
            children.push(ViewNode::Text(text));
        }
        children.extend(self.inner.children.iter().map(Element::to_node));
        ViewNode::Container {
            name: self.inner.tag.clone(),
            attributes: self.inner.attributes.clone(),
            children,
        }
    }

    /// Render this element to markup.
    pub fn render(&self) -> String {
        self.to_node().render()
    }
}

/// Consumes declarative props and produces an [`Element`].
#[derive(Default)]
pub struct ElementBuilder {
    tag: String,
    attributes: Vec<(String, Option<String>)>,
    styles: Vec<(String, String)>,
    text: Option<String>,
    bindings: Bindings,
    bind: Option<(Observed, String)>,
    store_bind: Option<String>,
    children: Vec<Element>,
}

impl ElementBuilder {
    /// Start building an element with the given tag.
    pub fn new(tag: &str) -> ElementBuilder {
        ElementBuilder {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    /// Add an unchanging attribute.
    pub fn attribute(mut self, name: &str, value: &str) -> ElementBuilder {
        self.attributes
            .push((name.to_string(), Some(value.to_string())));
        self
    }

    /// Add a valueless attribute.
    pub fn boolean_attribute(mut self, name: &str) -> ElementBuilder {
        self.attributes.push((name.to_string(), None));
        self
    }

    /// Shorthand for the `id` attribute.
    pub fn id(self, value: &str) -> ElementBuilder {
        self.attribute("id", value)
    }

    /// Shorthand for the `class` attribute.
    pub fn class(self, value: &str) -> ElementBuilder {
        self.attribute("class", value)
    }

    /// Add an unchanging style. Styles fold into a single `style` attribute
    /// at build time.
    pub fn style(mut self, name: &str, value: &str) -> ElementBuilder {
        self.styles.push((name.to_string(), value.to_string()));
        self
    }

    /// Set the element's text. `&(a.b)` placeholders make it reactive when
    /// paired with [`bindings`](ElementBuilder::bindings): any write to a
    /// bound property re-resolves the whole template into the element.
    pub fn text(mut self, text: &str) -> ElementBuilder {
        self.text = Some(text.to_string());
        self
    }

    /// Supply the objects that `&(a.b)` placeholders resolve against.
    pub fn bindings(mut self, bindings: Bindings) -> ElementBuilder {
        self.bindings = bindings;
        self
    }

    /// Bind the element's text to one property of an observed object: the
    /// current value now, every write later.
    pub fn bind(mut self, object: &Observed, key: &str) -> ElementBuilder {
        self.bind = Some((object.clone(), key.to_string()));
        self
    }

    /// Bind the element's text to a store entry. Wired by
    /// [`build_with`](ElementBuilder::build_with).
    pub fn bind_store(mut self, name: &str) -> ElementBuilder {
        self.store_bind = Some(name.to_string());
        self
    }

    /// Append a child element.
    pub fn child(mut self, child: Element) -> ElementBuilder {
        self.children.push(child);
        self
    }

    /// Append many child elements.
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> ElementBuilder {
        self.children.extend(children);
        self
    }

    /// Build the element, wiring placeholder and property bindings.
    ///
    /// A [`bind_store`](ElementBuilder::bind_store) prop needs the store and
    /// is ignored here; use [`build_with`](ElementBuilder::build_with).
    pub fn build(self) -> Element {
        let (element, pending) = self.construct();
        if let Some(name) = pending {
            warn!(
                "element {:?} was bound to store entry {:?} but built without a store",
                element.tag(),
                name
            );
        }
        element
    }

    /// Build the element, additionally wiring any store binding.
    pub fn build_with(self, store: &mut Store) -> Result<Element, StoreError> {
        let (mut element, pending) = self.construct();
        if let Some(name) = pending {
            let initial = store.get(&name).map(template::display).unwrap_or_default();
            element.inner.set_text(initial);

            let target = element.inner.clone();
            let id = store.subscribe(&name, move |value| {
                target.set_text(template::display(value));
            })?;
            element.store_subscriptions.push((name, id));
        }
        Ok(element)
    }

    fn construct(self) -> (Element, Option<String>) {
        let ElementBuilder {
            tag,
            mut attributes,
            styles,
            text,
            bindings,
            bind,
            store_bind,
            children,
        } = self;
        trace!("building element {:?}", tag);

        if !styles.is_empty() {
            let style = styles
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            attributes.push(("style".to_string(), Some(style)));
        }

        let inner = Arc::new(ElementInner {
            tag,
            attributes,
            text: Mutex::new(None),
            children,
        });
        let mut observations = Vec::new();

        if let Some(template_text) = text {
            let pairs = template::placeholders(&template_text);
            if pairs.is_empty() {
                inner.set_text(template_text);
            } else {
                inner.set_text(template::resolve(&template_text, &bindings.snapshot()));
                for (name, key) in pairs {
                    let Some(object) = bindings.get(&name).cloned() else {
                        continue;
                    };
                    let template_text = template_text.clone();
                    let bindings = bindings.clone();
                    let target = inner.clone();
                    observations.push(object.observe(key, move || {
                        target.set_text(template::resolve(&template_text, &bindings.snapshot()));
                    }));
                }
            }
        }

        if let Some((object, key)) = bind {
            let display = |value| template::display(&value);
            inner.set_text(object.get(&key).map(display).unwrap_or_default());

            let source = object.clone();
            let read_key = key.clone();
            let target = inner.clone();
            observations.push(object.observe(key, move || {
                target.set_text(source.get(&read_key).map(display).unwrap_or_default());
            }));
        }

        (
            Element {
                inner,
                observations,
                store_subscriptions: Vec::new(),
            },
            store_bind,
        )
    }
}
