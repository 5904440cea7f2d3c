/// A stable handle into a `Tree`'s arena. Stays valid across edits until the
/// node it names is removed; never reused within one `Tree`'s lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element {
        name: String,
        /// Order-preserving; duplicate keys are not deduplicated, matching
        /// whatever the source document contained.
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// `false` once removed from the tree; the arena slot is retained (not
    /// reclaimed) so outstanding `NodeId`s fail predictably instead of
    /// aliasing a future unrelated node.
    pub alive: bool,
}

impl Node {
    pub fn element(name: impl Into<String>, attrs: Vec<(String, String)>) -> Self {
        Self {
            kind: NodeKind::Element { name: name.into(), attrs },
            parent: None,
            children: Vec::new(),
            alive: true,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text(content.into()),
            parent: None,
            children: Vec::new(),
            alive: true,
        }
    }
}

/// Where to place a node relative to its new parent or a sibling (§4.3).
#[derive(Debug, Clone, Copy)]
pub enum Position {
    Top,
    Bottom,
    Before(NodeId),
    After(NodeId),
}
