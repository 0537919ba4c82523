use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ContainerId(pub(crate) usize);

/// One rendered collapsible container and its animation bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct ContainerRecord {
    pub(crate) tier: Tier,
    pub(crate) wrapper: NodeId,
    pub(crate) header: NodeId,
    pub(crate) title: NodeId,
    pub(crate) indicator: NodeId,
    pub(crate) content: NodeId,
    pub(crate) inner: NodeId,
    pub(crate) parent: Option<ContainerId>,
    pub(crate) children: Vec<ContainerId>,
    pub(crate) height: HeightState,
    pub(crate) constraint: HeightConstraint,
    /// Bumped on every toggle; deferred steps carrying an older value are
    /// stale and get dropped.
    pub(crate) generation: u64,
}

impl ContainerRecord {
    pub(crate) fn is_expanded(&self) -> bool {
        self.height != HeightState::Collapsed
    }
}

/// Container lookup built at render time, so toggles never have to work out
/// a container's tier from its class names.
#[derive(Debug, Default)]
pub(crate) struct ContainerRegistry {
    records: Vec<ContainerRecord>,
    by_header: HashMap<NodeId, ContainerId>,
    by_content: HashMap<NodeId, ContainerId>,
    by_wrapper: HashMap<NodeId, ContainerId>,
}

impl ContainerRegistry {
    fn register(&mut self, record: ContainerRecord) -> ContainerId {
        let id = ContainerId(self.records.len());
        self.by_header.insert(record.header, id);
        self.by_content.insert(record.content, id);
        self.by_wrapper.insert(record.wrapper, id);
        if let Some(parent) = record.parent {
            self.records[parent.0].children.push(id);
        }
        self.records.push(record);
        id
    }

    pub(crate) fn get(&self, id: ContainerId) -> Option<&ContainerRecord> {
        self.records.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: ContainerId) -> Option<&mut ContainerRecord> {
        self.records.get_mut(id.0)
    }

    pub(crate) fn by_header(&self, node: NodeId) -> Option<ContainerId> {
        self.by_header.get(&node).copied()
    }

    pub(crate) fn by_content(&self, node: NodeId) -> Option<ContainerId> {
        self.by_content.get(&node).copied()
    }

    pub(crate) fn by_wrapper(&self, node: NodeId) -> Option<ContainerId> {
        self.by_wrapper.get(&node).copied()
    }

    /// Container whose header, content or wrapper is exactly `node`.
    pub(crate) fn by_any_part(&self, node: NodeId) -> Option<ContainerId> {
        self.by_header(node)
            .or_else(|| self.by_content(node))
            .or_else(|| self.by_wrapper(node))
    }

    /// Ids in render (document) order.
    pub(crate) fn ids(&self) -> Vec<ContainerId> {
        (0..self.records.len()).map(ContainerId).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &ContainerRecord> {
        self.records.iter()
    }
}

#[derive(Debug)]
pub(crate) struct RenderOutput {
    pub(crate) registry: ContainerRegistry,
    pub(crate) preamble_kept: usize,
    pub(crate) preamble_dropped: usize,
}

/// Replaces every child of `root` with the rendered outline.
///
/// Content handles are moved under their container's inner element; nothing
/// is cloned. Preamble nodes are re-attached ahead of the first section only
/// under [`PreamblePolicy::Keep`].
pub(crate) fn render_outline(
    dom: &mut Dom,
    root: NodeId,
    grouping: Grouping<NodeId>,
    config: &OutlineConfig,
) -> Result<RenderOutput> {
    dom.clear_children(root);

    let mut output = RenderOutput {
        registry: ContainerRegistry::default(),
        preamble_kept: 0,
        preamble_dropped: 0,
    };

    match config.preamble {
        PreamblePolicy::Keep => {
            for node in grouping.preamble {
                dom.append_child(root, node)?;
                output.preamble_kept += 1;
            }
        }
        PreamblePolicy::Drop => output.preamble_dropped = grouping.preamble.len(),
    }

    for section in grouping.sections {
        render_node(dom, root, section, None, config, &mut output.registry)?;
    }
    Ok(output)
}

fn render_node(
    dom: &mut Dom,
    parent_node: NodeId,
    node: OutlineNode<NodeId>,
    parent: Option<ContainerId>,
    config: &OutlineConfig,
    registry: &mut ContainerRegistry,
) -> Result<ContainerId> {
    let stem = node.tier.class_stem();

    let wrapper = append_div(dom, parent_node, stem)?;

    let header = append_div(dom, wrapper, &format!("{stem}-header"))?;
    dom.set_attr(header, "tabindex", "0")?;
    dom.set_attr(header, "role", "button")?;
    dom.set_attr(header, "aria-expanded", "false")?;

    let title = dom.create_detached_element("span");
    dom.set_class(title, &format!("{stem}-title"), true)?;
    dom.set_text_content(title, &node.title)?;
    dom.append_child(header, title)?;

    let indicator = dom.create_detached_element("span");
    dom.set_class(indicator, "toggle-icon", true)?;
    dom.set_attr(indicator, "aria-hidden", "true")?;
    dom.set_text_content(indicator, &config.collapsed_glyph)?;
    dom.append_child(header, indicator)?;

    let content = append_div(dom, wrapper, &format!("{stem}-content"))?;
    dom.set_style(content, "max-height", &HeightConstraint::Zero.css_value())?;
    let inner = append_div(dom, content, &format!("{stem}-inner"))?;

    for item in node.content {
        dom.append_child(inner, item)?;
    }

    let id = registry.register(ContainerRecord {
        tier: node.tier,
        wrapper,
        header,
        title,
        indicator,
        content,
        inner,
        parent,
        children: Vec::new(),
        height: HeightState::Collapsed,
        constraint: HeightConstraint::Zero,
        generation: 0,
    });

    for child in node.children {
        render_node(dom, inner, child, Some(id), config, registry)?;
    }
    Ok(id)
}

fn append_div(dom: &mut Dom, parent: NodeId, class_name: &str) -> Result<NodeId> {
    let div = dom.create_detached_element("div");
    dom.set_class(div, class_name, true)?;
    dom.append_child(parent, div)?;
    Ok(div)
}
