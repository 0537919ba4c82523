use super::*;

const ACTIVE_CLASS: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Expanded,
    Collapsed,
    /// A structural check failed; a `[warn]` line explains which.
    Skipped,
}

/// Keyboard key as delivered to a focused header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Other(String),
}

impl Key {
    /// Parses a `KeyboardEvent.key` style name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" => Self::Enter,
            " " | "Space" | "Spacebar" => Self::Space,
            other => Self::Other(other.to_string()),
        }
    }

    /// Legacy `keyCode` values.
    pub fn from_code(code: u32) -> Self {
        match code {
            13 => Self::Enter,
            32 => Self::Space,
            other => Self::Other(format!("keyCode:{other}")),
        }
    }

    fn activates(&self) -> bool {
        matches!(self, Self::Enter | Self::Space)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOutcome {
    /// `None` when the key did not reach a header or is not an activation key.
    pub toggled: Option<ToggleOutcome>,
    pub default_prevented: bool,
}

impl Page {
    pub fn toggle_section(&mut self, header_selector: &str) -> Result<ToggleOutcome> {
        self.toggle_tier(Tier::Section, header_selector)
    }

    pub fn toggle_subsection(&mut self, header_selector: &str) -> Result<ToggleOutcome> {
        self.toggle_tier(Tier::Subsection, header_selector)
    }

    pub fn toggle_subsubsection(&mut self, header_selector: &str) -> Result<ToggleOutcome> {
        self.toggle_tier(Tier::SubSubsection, header_selector)
    }

    pub fn toggle_session(&mut self, header_selector: &str) -> Result<ToggleOutcome> {
        self.toggle_tier(Tier::Session, header_selector)
    }

    pub fn toggle_tier(&mut self, tier: Tier, header_selector: &str) -> Result<ToggleOutcome> {
        let header = self.select_one(header_selector)?;
        self.toggle_header(Some(tier), header)
    }

    /// Toggles the container owning `header`. With `expected` set, a
    /// container of another tier is left alone.
    pub(crate) fn toggle_header(
        &mut self,
        expected: Option<Tier>,
        header: NodeId,
    ) -> Result<ToggleOutcome> {
        let Some(id) = self.registry.by_header(header) else {
            self.trace.warn(format!(
                "toggle target is not a registered header: {}",
                self.node_snippet(header)
            ));
            return Ok(ToggleOutcome::Skipped);
        };
        let Some(record) = self.registry.get(id) else {
            return Ok(ToggleOutcome::Skipped);
        };

        if let Some(tier) = expected {
            if record.tier != tier {
                self.trace.warn(format!(
                    "{} toggle on a {} header",
                    tier.class_stem(),
                    record.tier.class_stem()
                ));
                return Ok(ToggleOutcome::Skipped);
            }
        }
        if self.dom.next_element_sibling(header) != Some(record.content) {
            self.trace.warn(format!(
                "{} header has no content container after it",
                record.tier.class_stem()
            ));
            return Ok(ToggleOutcome::Skipped);
        }
        if self.dom.parent(record.indicator) != Some(header) {
            self.trace.warn(format!(
                "{} header has lost its toggle indicator",
                record.tier.class_stem()
            ));
            return Ok(ToggleOutcome::Skipped);
        }

        if record.is_expanded() {
            self.collapse_container(id)?;
            Ok(ToggleOutcome::Collapsed)
        } else {
            self.expand_container(id)?;
            Ok(ToggleOutcome::Expanded)
        }
    }

    pub(crate) fn expand_container(&mut self, id: ContainerId) -> Result<()> {
        let Some(record) = self.registry.get(id) else {
            return Err(Error::Dom(format!("unknown container {}", id.0)));
        };
        let tier = record.tier;

        // A subsection opens its sub-subsections with it.
        let forced = if tier == Tier::Subsection {
            record
                .children
                .iter()
                .copied()
                .filter(|child| {
                    self.registry.get(*child).is_some_and(|child| {
                        child.tier == Tier::SubSubsection && !child.is_expanded()
                    })
                })
                .collect::<Vec<_>>()
        } else {
            Vec::new()
        };

        self.mark_expanded(id, true)?;
        for child in &forced {
            self.mark_expanded(*child, true)?;
            self.begin_expand_height(*child, self.config.transition_ms)?;
        }

        let settle_delay = if forced.is_empty() {
            self.config.transition_ms
        } else {
            self.config.transition_ms + self.config.cascade_stagger_ms
        };
        let measured = self.begin_expand_height(id, settle_delay)?;
        self.trace.toggle_line(format!(
            "[toggle] expand {}#{} forced_children={} target={}px",
            tier.class_stem(),
            id.0,
            forced.len(),
            measured
        ));
        Ok(())
    }

    pub(crate) fn collapse_container(&mut self, id: ContainerId) -> Result<()> {
        let tier = match self.registry.get(id) {
            Some(record) => record.tier,
            None => return Err(Error::Dom(format!("unknown container {}", id.0))),
        };
        self.mark_expanded(id, false)?;
        self.collapse_height(id)?;
        self.trace.toggle_line(format!(
            "[toggle] collapse {}#{}",
            tier.class_stem(),
            id.0
        ));
        Ok(())
    }

    /// Flips the visible markers and bumps the generation so in-flight
    /// deferred steps for the previous state are ignored.
    fn mark_expanded(&mut self, id: ContainerId, expanded: bool) -> Result<()> {
        let Some(record) = self.registry.get_mut(id) else {
            return Err(Error::Dom(format!("unknown container {}", id.0)));
        };
        record.generation += 1;
        if !expanded {
            record.height = HeightState::Collapsed;
        }
        let (header, content, indicator) = (record.header, record.content, record.indicator);

        self.dom.set_class(header, ACTIVE_CLASS, expanded)?;
        self.dom.set_class(content, ACTIVE_CLASS, expanded)?;
        self.dom
            .set_attr(header, "aria-expanded", if expanded { "true" } else { "false" })?;
        let glyph = if expanded {
            self.config.expanded_glyph.clone()
        } else {
            self.config.collapsed_glyph.clone()
        };
        self.dom.set_text_content(indicator, &glyph)
    }

    /// Collapses every expanded container. Returns how many were toggled.
    pub fn collapse_all(&mut self) -> Result<usize> {
        let mut toggled = 0;
        for id in self.registry.ids() {
            if self.registry.get(id).is_some_and(ContainerRecord::is_expanded) {
                self.collapse_container(id)?;
                toggled += 1;
            }
        }
        self.trace
            .toggle_line(format!("[toggle] collapse_all toggled={toggled}"));
        Ok(toggled)
    }

    /// Expands every collapsed container. State is re-read per container, so
    /// sub-subsections already opened by their subsection are not flipped
    /// back.
    pub fn expand_all(&mut self) -> Result<usize> {
        let mut toggled = 0;
        for id in self.registry.ids() {
            if self
                .registry
                .get(id)
                .is_some_and(|record| !record.is_expanded())
            {
                self.expand_container(id)?;
                toggled += 1;
            }
        }
        self.trace
            .toggle_line(format!("[toggle] expand_all toggled={toggled}"));
        Ok(toggled)
    }

    /// Pointer activation. Anything inside a header resolves to that header;
    /// clicks elsewhere do nothing.
    pub fn click(&mut self, selector: &str) -> Result<ToggleOutcome> {
        let target = self.select_one(selector)?;
        let header = if self.registry.by_header(target).is_some() {
            Some(target)
        } else {
            self.dom
                .ancestors(target)
                .find(|node| self.registry.by_header(*node).is_some())
        };
        let Some(header) = header else {
            return Ok(ToggleOutcome::Skipped);
        };
        self.active_element = Some(header);
        self.toggle_header(None, header)
    }

    pub fn focus(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.active_element = Some(target);
        Ok(())
    }

    pub fn blur(&mut self) {
        self.active_element = None;
    }

    /// Delivers a keydown to the focused element.
    pub fn press_key(&mut self, key: Key) -> Result<KeyOutcome> {
        let ignored = KeyOutcome {
            toggled: None,
            default_prevented: false,
        };
        let Some(target) = self.active_element else {
            return Ok(ignored);
        };
        if self.registry.by_header(target).is_none() || !key.activates() {
            return Ok(ignored);
        }
        self.trace
            .toggle_line(format!("[toggle] key {key:?} on header"));
        let toggled = self.toggle_header(None, target)?;
        Ok(KeyOutcome {
            toggled: Some(toggled),
            default_prevented: true,
        })
    }

    pub fn key_down(&mut self, selector: &str, key: Key) -> Result<KeyOutcome> {
        self.focus(selector)?;
        self.press_key(key)
    }

    /// Whether the container owning the matched header, content or wrapper
    /// is expanded.
    pub fn is_expanded(&self, selector: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        let record = self.container_for(target)?;
        Ok(record.is_expanded())
    }

    pub fn height_state(&self, selector: &str) -> Result<HeightState> {
        let target = self.select_one(selector)?;
        Ok(self.container_for(target)?.height)
    }

    pub fn height_constraint(&self, selector: &str) -> Result<HeightConstraint> {
        let target = self.select_one(selector)?;
        Ok(self.container_for(target)?.constraint)
    }

    pub fn expanded_count(&self) -> usize {
        self.registry
            .records()
            .filter(|record| record.is_expanded())
            .count()
    }

    pub fn container_count(&self) -> usize {
        self.registry.len()
    }

    fn container_for(&self, node: NodeId) -> Result<&ContainerRecord> {
        self.registry
            .by_any_part(node)
            .and_then(|id| self.registry.get(id))
            .ok_or_else(|| {
                Error::Dom(format!(
                    "not part of a collapsible container: {}",
                    self.node_snippet(node)
                ))
            })
    }
}
