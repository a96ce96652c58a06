//! Immutable document tree
//!
//! Markup is parsed with `scraper` (html5ever), which recovers from any
//! malformed or truncated input, and copied into a flat arena of
//! [`Node`]s. Ids are assigned in document order (pre-order), so comparing
//! ids compares positions. All walks are iterative.

/// Index of a node in a [`Dom`]
pub type NodeId = usize;

/// Id of the document root
pub const ROOT: NodeId = 0;

/// Name given to the synthetic root element
const DOCUMENT_NAME: &str = "#document";

/// A node of the parsed tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// An element with lowercased name and attribute names
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
        }
    }

    /// Value of an attribute
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Parsed document
#[derive(Debug, Clone)]
pub struct Dom {
    entries: Vec<Entry>,
}

impl Dom {
    /// Parse an HTML document; never fails
    pub fn parse(html: &str) -> Self {
        let document = scraper::Html::parse_document(html);
        let mut entries: Vec<Entry> = Vec::new();
        let mut stack = vec![(document.tree.root(), None::<NodeId>)];

        while let Some((source, parent)) = stack.pop() {
            let node = match source.value() {
                scraper::Node::Document | scraper::Node::Fragment => {
                    Node::Element(Element::new(DOCUMENT_NAME))
                }
                scraper::Node::Element(el) => Node::Element(Element {
                    name: el.name().to_ascii_lowercase(),
                    attrs: el
                        .attrs()
                        .map(|(key, value)| (key.to_ascii_lowercase(), value.to_string()))
                        .collect(),
                }),
                scraper::Node::Text(text) => Node::Text(String::from(&**text)),
                scraper::Node::Comment(comment) => Node::Comment(String::from(&**comment)),
                _ => continue,
            };

            let id = entries.len();
            entries.push(Entry {
                node,
                parent,
                children: Vec::new(),
            });
            if let Some(parent) = parent {
                entries[parent].children.push(id);
            }
            for child in source.children().rev() {
                stack.push((child, Some(id)));
            }
        }

        Self { entries }
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.entries[id].node
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.entries[id].node {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.entries[id].children
    }

    /// True if `ancestor` is `id` or one of its ancestors
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// First element with the given name, in document order
    pub fn find_first(&self, name: &str) -> Option<NodeId> {
        self.entries.iter().position(|entry| match &entry.node {
            Node::Element(el) => el.name == name,
            _ => false,
        })
    }

    /// All elements with the given name, in document order
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.entries
            .iter()
            .enumerate()
            .filter(move |(_, entry)| matches!(&entry.node, Node::Element(el) if el.name == name))
            .map(|(id, _)| id)
    }

    /// True if a proper ancestor of `id` has the given name
    pub fn has_ancestor_named(&self, id: NodeId, name: &str) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if self.element(node).is_some_and(|el| el.name == name) {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Text of all descendants, whitespace collapsed
    pub fn text_content(&self, id: NodeId) -> String {
        let mut words: Vec<&str> = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match &self.entries[current].node {
                Node::Text(text) => words.extend(text.split_whitespace()),
                Node::Element(_) => stack.extend(self.children(current).iter().rev()),
                Node::Comment(_) => {}
            }
        }
        words.join(" ")
    }
}
