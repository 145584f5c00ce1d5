/// Attribute name/value pair. Names are canonical ASCII-lowercase; a `None`
/// value is a bare attribute (`<input disabled>`).
pub type Attribute = (String, Option<String>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

/// Detached DOM value tree. Live documents hold their nodes in
/// [`LiveDom`](crate::LiveDom); this type is what fragments parse into and
/// what a live subtree materializes back to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Document {
        doctype: Option<String>,
        children: Vec<Node>,
    },
    Element {
        name: String,
        attributes: Vec<Attribute>,
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl Node {
    pub fn element(name: &str) -> Self {
        Node::Element {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        if let Node::Element { attributes, .. } = &mut self {
            attributes.push((key.to_ascii_lowercase(), Some(value.to_string())));
        }
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        if let Some(children) = self.children_mut() {
            children.push(child);
        }
        self
    }

    /// Lowercase tag name for elements.
    pub fn element_name(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => crate::dom_utils::get_attr(attributes, key),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { children, .. } | Node::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document { children, .. } => Some(children),
            Node::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element { .. })
    }

    /// Whitespace-only text, which fragment parsing and outlines ignore.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text { text } if text.trim().is_empty())
    }
}
