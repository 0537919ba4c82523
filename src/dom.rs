use super::*;
use std::collections::BTreeMap;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Attributes are kept sorted so serialized markup is stable.
#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag: String,
    pub(crate) attrs: BTreeMap<String, String>,
}

impl Element {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub(crate) fn has_class(&self, class_name: &str) -> bool {
        class_list_contains(self.attr("class"), class_name)
    }
}

/// Document tree in an arena. Nodes are never freed; detaching only unlinks
/// them, so a `NodeId` stays valid for the lifetime of the `Dom` and a
/// flattened outline can re-parent its old headings and content.
#[derive(Debug, Clone)]
pub(crate) struct Dom {
    nodes: Vec<Node>,
    pub(crate) root: NodeId,
}

impl Dom {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
        }
    }

    fn push_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag: String,
        attrs: BTreeMap<String, String>,
    ) -> NodeId {
        self.push_node(Some(parent), NodeKind::Element(Element { tag, attrs }))
    }

    pub(crate) fn create_detached_element(&mut self, tag: &str) -> NodeId {
        let element = Element {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
        };
        self.push_node(None, NodeKind::Element(element))
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.push_node(Some(parent), NodeKind::Text(text))
    }

    /// Appends text to `parent`, extending its last child when that is
    /// already a text node.
    pub(crate) fn push_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent.0].children.last() {
            if let NodeKind::Text(existing) = &mut self.nodes[last.0].kind {
                existing.push_str(text);
                return;
            }
        }
        self.create_text(parent, text.to_string());
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node_id: NodeId, action: &str) -> Result<&mut Element> {
        match self.nodes.get_mut(node_id.0).map(|node| &mut node.kind) {
            Some(NodeKind::Element(element)) => Ok(element),
            _ => Err(Error::Dom(format!("{action} target is not an element"))),
        }
    }

    pub(crate) fn text(&self, node_id: NodeId) -> Option<&str> {
        match &self.nodes.get(node_id.0)?.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn is_text(&self, node_id: NodeId) -> bool {
        self.text(node_id).is_some()
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|element| element.tag.as_str())
    }

    pub(crate) fn has_tag(&self, node_id: NodeId, tag: &str) -> bool {
        self.tag_name(node_id)
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
    }

    pub(crate) fn heading_level(&self, node_id: NodeId) -> Option<u8> {
        self.tag_name(node_id).and_then(heading_level)
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes[node_id.0].parent
    }

    pub(crate) fn children(&self, node_id: NodeId) -> &[NodeId] {
        &self.nodes[node_id.0].children
    }

    pub(crate) fn element_children(&self, node_id: NodeId) -> Vec<NodeId> {
        self.children(node_id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
            .collect()
    }

    /// Parent, grandparent, and so on up to the document.
    pub(crate) fn ancestors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node_id), |current| self.parent(*current))
    }

    pub(crate) fn is_connected(&self, node_id: NodeId) -> bool {
        node_id == self.root || self.ancestors(node_id).any(|node| node == self.root)
    }

    pub(crate) fn next_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        self.children(parent)
            .iter()
            .skip_while(|sibling| **sibling != node_id)
            .skip(1)
            .copied()
            .find(|sibling| self.element(*sibling).is_some())
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node_id, &mut out);
        out
    }

    fn collect_text(&self, node_id: NodeId, out: &mut String) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            match &self.nodes[node_id.0].kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Document | NodeKind::Element(_) => {
                    for child in &self.nodes[node_id.0].children {
                        self.collect_text(*child, out);
                    }
                }
            }
        })
    }

    pub(crate) fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        self.element_mut(node_id, "textContent")?;
        self.clear_children(node_id);
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        Ok(())
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_mut(node_id, "setAttribute")?
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    pub(crate) fn has_class(&self, node_id: NodeId, class_name: &str) -> bool {
        self.element(node_id)
            .is_some_and(|element| element.has_class(class_name))
    }

    pub(crate) fn set_class(&mut self, node_id: NodeId, class_name: &str, present: bool) -> Result<()> {
        let element = self.element_mut(node_id, "classList")?;
        match class_list_with(element.attr("class"), class_name, present) {
            Some(classes) => element.attrs.insert("class".into(), classes),
            None => element.attrs.remove("class"),
        };
        Ok(())
    }

    pub(crate) fn style(&self, node_id: NodeId, property: &str) -> Option<String> {
        let element = self.element(node_id)?;
        InlineStyle::parse(element.attr("style"))
            .get(property)
            .map(str::to_string)
    }

    pub(crate) fn set_style(&mut self, node_id: NodeId, property: &str, value: &str) -> Result<()> {
        let element = self.element_mut(node_id, "style")?;
        let mut style = InlineStyle::parse(element.attr("style"));
        style.set(property, value);
        match style.to_attr() {
            Some(attr) => element.attrs.insert("style".into(), attr),
            None => element.attrs.remove("style"),
        };
        Ok(())
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.attach(parent, child, None)
    }

    pub(crate) fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<()> {
        if child == reference {
            return Ok(());
        }
        if self.parent(reference) != Some(parent) {
            return Err(Error::Dom("insertBefore reference is not a direct child".into()));
        }
        self.attach(parent, child, Some(reference))
    }

    /// Moves `child` under `parent`, before `reference` or at the end.
    fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        if child.0 >= self.nodes.len() || child == self.root {
            return Err(Error::Dom(format!("node #{} cannot be attached", child.0)));
        }
        if self.is_text(parent) {
            return Err(Error::Dom("text nodes cannot have children".into()));
        }
        if parent == child || self.ancestors(parent).any(|node| node == child) {
            return Err(Error::Dom("attaching would create a cycle".into()));
        }

        self.detach(child);
        let siblings = &mut self.nodes[parent.0].children;
        let index = match reference {
            Some(reference) => siblings
                .iter()
                .position(|id| *id == reference)
                .ok_or_else(|| Error::Dom("insertBefore reference is missing".into()))?,
            None => siblings.len(),
        };
        siblings.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Unlinks `node_id` from its parent. The subtree stays intact.
    pub(crate) fn detach(&mut self, node_id: NodeId) {
        if let Some(parent) = self.nodes[node_id.0].parent.take() {
            self.nodes[parent.0].children.retain(|id| *id != node_id);
        }
    }

    /// Detaches every child of `node_id` and returns them in document order.
    pub(crate) fn clear_children(&mut self, node_id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in &children {
            self.nodes[child.0].parent = None;
        }
        children
    }

    /// Element descendants of `node_id` in document order.
    pub(crate) fn descendant_elements(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.children(node_id).iter().rev().copied().collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            if self.element(node).is_some() {
                out.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node_id, &mut out);
        out
    }

    fn write_markup(&self, node_id: NodeId, out: &mut String) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            let node = &self.nodes[node_id.0];
            match &node.kind {
                NodeKind::Document => {}
                NodeKind::Text(text) => {
                    let raw_parent = node
                        .parent
                        .and_then(|parent| self.tag_name(parent))
                        .is_some_and(html::is_raw_text_tag);
                    if raw_parent {
                        out.push_str(text);
                    } else {
                        push_escaped(out, text, Escape::Text);
                    }
                    return;
                }
                NodeKind::Element(element) => {
                    out.push('<');
                    out.push_str(&element.tag);
                    for (name, value) in &element.attrs {
                        out.push(' ');
                        out.push_str(name);
                        out.push_str("=\"");
                        push_escaped(out, value, Escape::Attr);
                        out.push('"');
                    }
                    out.push('>');
                    if html::is_void_tag(&element.tag) {
                        return;
                    }
                }
            }

            for child in &node.children {
                self.write_markup(*child, out);
            }
            if let NodeKind::Element(element) = &node.kind {
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        })
    }
}
