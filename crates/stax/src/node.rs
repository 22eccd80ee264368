//! A string-renderable view tree, standing in for a real UI document.
//!
//! Built elements snapshot into this tree for rendering and inspection; no
//! host document is involved anywhere.

/// One node of the view tree.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewNode {
    /// A text node.
    Text(String),
    /// An element with a tag name, attributes and children. An attribute
    /// with a `None` value renders as a boolean attribute.
    Container {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        children: Vec<ViewNode>,
    },
}

impl ViewNode {
    /// The concatenated text of this node and all of its descendants.
    pub fn text_content(&self) -> String {
        match self {
            ViewNode::Text(text) => text.clone(),
            ViewNode::Container { children, .. } => {
                children.iter().map(ViewNode::text_content).collect()
            }
        }
    }

    /// Render this node to markup.
    pub fn render(&self) -> String {
        match self {
            ViewNode::Text(text) => text.clone(),
            ViewNode::Container {
                name,
                attributes,
                children,
            } => {
                let atts = attributes
                    .iter()
                    .map(|(key, may_val)| {
                        if let Some(val) = may_val {
                            format!(r#"{}="{}""#, key, val)
                        } else {
                            key.to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ");

                if children.is_empty() {
                    if attributes.is_empty() {
                        format!("<{} />", name)
                    } else {
                        format!("<{} {} />", name, atts)
                    }
                } else {
                    let kids = children
                        .iter()
                        .map(|k| k.render().trim().to_string())
                        .collect::<Vec<String>>()
                        .join(" ");
                    if attributes.is_empty() {
                        format!("<{}>{}</{}>", name, kids, name)
                    } else {
                        format!("<{} {}>{}</{}>", name, atts, kids, name)
                    }
                }
            }
        }
    }
}

impl From<ViewNode> for String {
    fn from(node: ViewNode) -> String {
        node.render()
    }
}
