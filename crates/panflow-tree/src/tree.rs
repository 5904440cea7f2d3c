use crate::node::{Node, NodeId, NodeKind, Position};
use crate::xpath::{self, ParsedPath, Step};
use panflow_model::{PanflowError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

/// The parsed `<?xml version="..." encoding="..." standalone="..."?>` header,
/// if the source document had one. Carried as its constituent fields rather
/// than the raw tag text so `serialize()` can reconstruct it exactly instead
/// of assuming UTF-8/1.0.
#[derive(Debug, Clone)]
struct Declaration {
    version: String,
    encoding: Option<String>,
    standalone: Option<String>,
}

/// Owns the parsed XML document (§4.3). The only authoritative store in one
/// invocation: everything else (graph, reference index) is a read-only view
/// derived from it and invalidated through `generation()`.
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    declaration: Option<Declaration>,
    generation: u64,
}

impl Tree {
    /// Parses `bytes` once. Preserves element/attribute order; whitespace
    /// and comments are preserved to the extent `quick-xml`'s pull parser
    /// reports them as events (insignificant whitespace between tags is
    /// represented as `Text` nodes like any other text content).
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text = false;

        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;
        let mut declaration = None;

        let mut buf = Vec::new();
        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| PanflowError::ParseFailed(e.to_string()))?;
            match event {
                Event::Decl(decl) => {
                    declaration = Some(parse_declaration(&decl)?);
                }
                Event::Start(start) => {
                    let id = push_element(&mut nodes, &start)?;
                    attach(&mut nodes, &mut stack, &mut root, id)?;
                    stack.push(id);
                }
                Event::Empty(start) => {
                    let id = push_element(&mut nodes, &start)?;
                    attach(&mut nodes, &mut stack, &mut root, id)?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    let content = text
                        .unescape()
                        .map_err(|e| PanflowError::ParseFailed(e.to_string()))?
                        .into_owned();
                    let id = nodes.len();
                    nodes.push(Node::text(content));
                    attach(&mut nodes, &mut stack, &mut root, NodeId(id))?;
                }
                Event::Comment(comment) => {
                    let content = comment
                        .decode()
                        .map_err(|e| PanflowError::ParseFailed(e.to_string()))?
                        .into_owned();
                    let id = nodes.len();
                    nodes.push(Node {
                        kind: NodeKind::Comment(content),
                        parent: None,
                        children: Vec::new(),
                        alive: true,
                    });
                    attach(&mut nodes, &mut stack, &mut root, NodeId(id))?;
                }
                Event::CData(cdata) => {
                    let content = String::from_utf8_lossy(cdata.as_ref()).into_owned();
                    let id = nodes.len();
                    nodes.push(Node::text(content));
                    attach(&mut nodes, &mut stack, &mut root, NodeId(id))?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { nodes, root, declaration, generation: 0 })
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).map(|n| n.alive).unwrap_or(false)
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    pub fn set_attr(&mut self, id: NodeId, key: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(id).kind {
            if let Some(existing) = attrs.iter_mut().find(|(k, _)| k == key) {
                existing.1 = value.to_string();
            } else {
                attrs.push((key.to_string(), value.to_string()));
            }
        }
        self.bump();
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Only the `Element` children, in document order — the view most tree
    /// callers want (accessors iterate object/policy entries, not text
    /// nodes).
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| matches!(self.node(*c).kind, NodeKind::Element { .. }))
    }

    pub fn element_children_named<'a>(&'a self, id: NodeId, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.element_children(id)
            .filter(move |c| self.element_name(*c) == Some(name))
    }

    /// Concatenation of all direct text-node children (member-list leaves
    /// and scalar properties are always flat `<tag>value</tag>` — no mixed
    /// content to worry about in this schema family).
    pub fn text_content(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|c| match &self.node(*c).kind {
                NodeKind::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Replaces all text-node children with a single node carrying `text`.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let existing_text_children: Vec<NodeId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|c| matches!(self.node(*c).kind, NodeKind::Text(_)))
            .collect();
        for child in existing_text_children {
            self.node_mut(id).children.retain(|c| *c != child);
            self.node_mut(child).alive = false;
        }
        let text_id = NodeId(self.nodes.len());
        self.nodes.push(Node::text(text));
        self.node_mut(text_id).parent = Some(id);
        self.node_mut(id).children.push(text_id);
        self.bump();
    }

    /// Creates a new, detached element node ready to be `insert`ed.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::element(name, Vec::new()));
        id
    }

    pub fn insert(&mut self, parent: NodeId, element: NodeId, position: Position) -> Result<()> {
        if self.node(element).parent.is_some() {
            return Err(PanflowError::ParseFailed(
                "cannot insert a node that already has a parent; clone or remove it first".to_string(),
            ));
        }
        self.node_mut(element).parent = Some(parent);
        match position {
            Position::Top => self.node_mut(parent).children.insert(0, element),
            Position::Bottom => self.node_mut(parent).children.push(element),
            Position::Before(reference) => {
                let idx = self.child_index(parent, reference)?;
                self.node_mut(parent).children.insert(idx, element);
            }
            Position::After(reference) => {
                let idx = self.child_index(parent, reference)?;
                self.node_mut(parent).children.insert(idx + 1, element);
            }
        }
        self.bump();
        Ok(())
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> Result<usize> {
        self.node(parent)
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or_else(|| PanflowError::ParseFailed("reference node is not a child of the given parent".to_string()))
    }

    pub fn remove(&mut self, element: NodeId) -> Result<()> {
        if let Some(parent) = self.node(element).parent {
            self.node_mut(parent).children.retain(|c| *c != element);
        }
        self.mark_subtree_dead(element);
        self.bump();
        Ok(())
    }

    fn mark_subtree_dead(&mut self, id: NodeId) {
        self.node_mut(id).alive = false;
        self.node_mut(id).parent = None;
        let children = self.node(id).children.clone();
        for child in children {
            self.mark_subtree_dead(child);
        }
    }

    /// Replaces `element` in place: `replacement` takes its exact position
    /// among its parent's children. `element`'s own attributes are not
    /// preserved — callers that want to keep sibling attributes untouched
    /// should clone and edit rather than building a bare replacement (§3
    /// invariant: a reference-rewrite only changes textual member content,
    /// never structure — this `replace` primitive is for whole-element
    /// swaps used elsewhere, e.g. dedup object removal is a `remove`, not a
    /// `replace`).
    pub fn replace(&mut self, element: NodeId, replacement: NodeId) -> Result<()> {
        let parent = self
            .node(element)
            .parent
            .ok_or_else(|| PanflowError::ParseFailed("cannot replace a detached node".to_string()))?;
        let idx = self.child_index(parent, element)?;
        self.node_mut(parent).children[idx] = replacement;
        self.node_mut(replacement).parent = Some(parent);
        self.node_mut(element).parent = None;
        self.mark_subtree_dead(element);
        self.bump();
        Ok(())
    }

    /// Deep-clones a subtree into fresh arena slots. `remap` is applied to
    /// every element name encountered (used by callers that want to rename
    /// entries while cloning, e.g. merge-with-rename); pass `|n| n.to_string()`
    /// for a verbatim clone.
    pub fn clone_subtree(&mut self, element: NodeId, remap: &dyn Fn(&str, &str) -> String) -> NodeId {
        let cloned = self.clone_node_only(element, remap);
        let children: Vec<NodeId> = self.node(element).children.clone();
        for child in children {
            let cloned_child = self.clone_subtree(child, remap);
            self.node_mut(cloned_child).parent = Some(cloned);
            self.node_mut(cloned).children.push(cloned_child);
        }
        cloned
    }

    fn clone_node_only(&mut self, element: NodeId, remap: &dyn Fn(&str, &str) -> String) -> NodeId {
        let kind = match &self.node(element).kind {
            NodeKind::Element { name, attrs } => {
                let new_attrs: Vec<(String, String)> = attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), remap(k, v)))
                    .collect();
                NodeKind::Element { name: name.clone(), attrs: new_attrs }
            }
            NodeKind::Text(t) => NodeKind::Text(t.clone()),
            NodeKind::Comment(c) => NodeKind::Comment(c.clone()),
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, parent: None, children: Vec::new(), alive: true });
        id
    }

    /// Reconstructs an XPath that currently locates `id` uniquely among its
    /// siblings, using 1-based `[N]` position predicates for disambiguation
    /// and `[@name='...']` where the element carries a `name` attribute
    /// (matches how the Schema Registry's templates address entries).
    /// Valid until the element is moved (§4.3 contract).
    pub fn xpath_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(name) = self.element_name(node_id) else { break };
            let segment = if let Some(name_attr) = self.attr(node_id, "name") {
                format!("{name}[@name='{name_attr}']")
            } else if let Some(parent) = self.parent(node_id) {
                let same_name: Vec<NodeId> = self.element_children_named(parent, name).collect();
                if same_name.len() > 1 {
                    let position = same_name.iter().position(|c| *c == node_id).unwrap_or(0) + 1;
                    format!("{name}[{position}]")
                } else {
                    name.to_string()
                }
            } else {
                name.to_string()
            };
            segments.push(segment);
            current = self.parent(node_id);
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    pub fn find(&self, xpath: &str) -> Result<Vec<NodeId>> {
        let parsed = xpath::parse(xpath)?;
        let Some(root) = self.root else { return Ok(Vec::new()) };
        let mut current = vec![root];
        for (i, step) in parsed.steps.iter().enumerate() {
            if i == 0 {
                current.retain(|id| self.element_name(*id) == Some(step.name.as_str()) && matches_predicates(self, *id, step));
                continue;
            }
            current = descend(self, &current, step);
        }
        Ok(current)
    }

    pub fn first(&self, xpath: &str) -> Result<Option<NodeId>> {
        Ok(self.find(xpath)?.into_iter().next())
    }

    /// Writes the document back out. Indentation/attribute quoting follow
    /// whatever `quick-xml`'s writer defaults produce — this does not
    /// attempt byte-identical pretty-printing of untouched regions beyond
    /// what the parser's preserved text/whitespace nodes already carry.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        if let Some(decl) = &self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new(&decl.version, decl.encoding.as_deref(), decl.standalone.as_deref())))
                .map_err(|e| PanflowError::SerializeFailed(e.to_string()))?;
        }
        if let Some(root) = self.root {
            self.write_node(&mut writer, root)?;
        }
        Ok(writer.into_inner().into_inner())
    }

    fn write_node(&self, writer: &mut Writer<Cursor<Vec<u8>>>, id: NodeId) -> Result<()> {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Element { name, attrs } => {
                if node.children.is_empty() {
                    let mut start = BytesStart::new(name.as_str());
                    for (k, v) in attrs {
                        start.push_attribute((k.as_str(), v.as_str()));
                    }
                    writer
                        .write_event(Event::Empty(start))
                        .map_err(|e| PanflowError::SerializeFailed(e.to_string()))?;
                } else {
                    let mut start = BytesStart::new(name.as_str());
                    for (k, v) in attrs {
                        start.push_attribute((k.as_str(), v.as_str()));
                    }
                    writer
                        .write_event(Event::Start(start))
                        .map_err(|e| PanflowError::SerializeFailed(e.to_string()))?;
                    for child in &node.children {
                        self.write_node(writer, *child)?;
                    }
                    writer
                        .write_event(Event::End(BytesEnd::new(name.as_str())))
                        .map_err(|e| PanflowError::SerializeFailed(e.to_string()))?;
                }
            }
            NodeKind::Text(text) => {
                let escaped = quick_xml::escape::escape(text);
                writer
                    .write_event(Event::Text(BytesText::from_escaped(escaped)))
                    .map_err(|e| PanflowError::SerializeFailed(e.to_string()))?;
            }
            NodeKind::Comment(text) => {
                writer
                    .write_event(Event::Comment(BytesText::new(text)))
                    .map_err(|e| PanflowError::SerializeFailed(e.to_string()))?;
            }
        }
        Ok(())
    }
}

fn parse_declaration(decl: &BytesDecl) -> Result<Declaration> {
    let version = decl
        .version()
        .map_err(|e| PanflowError::ParseFailed(e.to_string()))?;
    let encoding = decl
        .encoding()
        .transpose()
        .map_err(|e| PanflowError::ParseFailed(e.to_string()))?
        .map(|v| String::from_utf8_lossy(&v).into_owned());
    let standalone = decl
        .standalone()
        .transpose()
        .map_err(|e| PanflowError::ParseFailed(e.to_string()))?
        .map(|v| String::from_utf8_lossy(&v).into_owned());
    Ok(Declaration { version: String::from_utf8_lossy(&version).into_owned(), encoding, standalone })
}

fn push_element(nodes: &mut Vec<Node>, start: &BytesStart) -> Result<NodeId> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| PanflowError::ParseFailed(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attrs.push((key, value));
    }
    let id = NodeId(nodes.len());
    nodes.push(Node::element(name, attrs));
    Ok(id)
}

fn attach(nodes: &mut [Node], stack: &mut [NodeId], root: &mut Option<NodeId>, id: NodeId) -> Result<()> {
    if let Some(parent) = stack.last() {
        nodes[id.0].parent = Some(*parent);
        nodes[parent.0].children.push(id);
    } else if matches!(nodes[id.0].kind, NodeKind::Element { .. }) {
        *root = Some(id);
    }
    Ok(())
}

fn matches_predicates(tree: &Tree, id: NodeId, step: &Step) -> bool {
    step.predicates.iter().all(|(k, v)| tree.attr(id, k) == Some(v.as_str()))
}

fn descend(tree: &Tree, current: &[NodeId], step: &Step) -> Vec<NodeId> {
    let mut out = Vec::new();
    for id in current {
        for child in tree.element_children_named(*id, &step.name) {
            if matches_predicates(tree, child, step) {
                out.push(child);
            }
        }
    }
    out
}
