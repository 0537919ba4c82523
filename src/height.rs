use super::*;
use crate::layout::{LayoutHint, Measurer};
use crate::page::Deferred;

/// Inline `max-height` clip on a content container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightConstraint {
    Zero,
    Fixed(i64),
    Unconstrained,
}

impl HeightConstraint {
    pub fn css_value(&self) -> String {
        match self {
            Self::Zero => "0px".into(),
            Self::Fixed(px) => format!("{px}px"),
            Self::Unconstrained => "none".into(),
        }
    }

    pub fn from_css_value(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("none") {
            return Some(Self::Unconstrained);
        }
        let px = value.strip_suffix("px").unwrap_or(value).trim();
        match px.parse::<i64>().ok()? {
            0 => Some(Self::Zero),
            n if n > 0 => Some(Self::Fixed(n)),
            _ => None,
        }
    }
}

/// Expansion lifecycle of one container.
///
/// `Measuring` only exists inside a single expand call; it is observable in
/// the trace log but never between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightState {
    Collapsed,
    Measuring,
    Expanding { target_px: i64 },
    SettledExpanded,
}

impl Page {
    pub(crate) fn apply_constraint(
        &mut self,
        id: ContainerId,
        constraint: HeightConstraint,
    ) -> Result<()> {
        let Some(record) = self.registry.get_mut(id) else {
            return Err(Error::Dom(format!("unknown container {}", id.0)));
        };
        record.constraint = constraint;
        let content = record.content;
        self.dom
            .set_style(content, "max-height", &constraint.css_value())
    }

    fn set_height_state(&mut self, id: ContainerId, state: HeightState) {
        if let Some(record) = self.registry.get_mut(id) {
            record.height = state;
        }
    }

    /// Natural height of a container's content with its own clip lifted.
    pub(crate) fn measure_natural(&self, id: ContainerId) -> i64 {
        let Some(record) = self.registry.get(id) else {
            return 0;
        };
        let registry = &self.registry;
        let measurer = Measurer::new(&self.dom, self.config.layout, |node| {
            if registry.by_header(node).is_some() {
                return LayoutHint::Header;
            }
            match registry.by_content(node).and_then(|id| registry.get(id)) {
                Some(record) => LayoutHint::Clipped(record.constraint),
                None => LayoutHint::Flow,
            }
        });
        measurer.natural_height(record.content)
    }

    /// Runs the measure / fix / schedule-relax sequence for a container that
    /// has just been marked expanded.
    pub(crate) fn begin_expand_height(&mut self, id: ContainerId, settle_delay_ms: i64) -> Result<i64> {
        let (previous, generation, tier) = match self.registry.get(id) {
            Some(record) => (record.constraint, record.generation, record.tier),
            None => return Err(Error::Dom(format!("unknown container {}", id.0))),
        };

        self.set_height_state(id, HeightState::Measuring);
        self.apply_constraint(id, HeightConstraint::Unconstrained)?;
        let measured = self.measure_natural(id);
        self.apply_constraint(id, previous)?;

        let target = if measured > 0 {
            HeightConstraint::Fixed(measured)
        } else {
            HeightConstraint::Zero
        };
        self.apply_constraint(id, target)?;
        self.set_height_state(id, HeightState::Expanding { target_px: measured });

        let (timer_id, due_at) = self.scheduler.schedule(
            settle_delay_ms,
            Deferred::Settle {
                container: id,
                generation,
            },
        );
        self.trace.toggle_line(format!(
            "[height] expand {}#{} measured={}px settle_timer={} due_at={}",
            tier.class_stem(),
            id.0,
            measured,
            timer_id,
            due_at
        ));
        Ok(measured)
    }

    pub(crate) fn collapse_height(&mut self, id: ContainerId) -> Result<()> {
        self.apply_constraint(id, HeightConstraint::Zero)?;
        self.set_height_state(id, HeightState::Collapsed);
        let generation = self.registry.get(id).map(|r| r.generation).unwrap_or_default();
        let delay = self.config.transition_ms;
        self.scheduler.schedule(
            delay,
            Deferred::Cascade {
                container: id,
                generation,
            },
        );
        Ok(())
    }

    /// Relaxes a finished expansion to an unconstrained clip, then lets the
    /// ancestors catch up.
    pub(crate) fn settle(&mut self, id: ContainerId, generation: u64) -> Result<()> {
        let Some(record) = self.registry.get(id) else {
            self.trace
                .warn(format!("settle for unknown container {}", id.0));
            return Ok(());
        };
        if record.generation != generation || !matches!(record.height, HeightState::Expanding { .. }) {
            self.trace.timer_line(format!(
                "[height] stale settle {}#{} generation={} current={}",
                record.tier.class_stem(),
                id.0,
                generation,
                record.generation
            ));
            return Ok(());
        }

        self.apply_constraint(id, HeightConstraint::Unconstrained)?;
        self.set_height_state(id, HeightState::SettledExpanded);
        self.trace.toggle_line(format!(
            "[height] settled {}#{}",
            self.registry.get(id).map(|r| r.tier.class_stem()).unwrap_or("?"),
            id.0
        ));
        self.cascade_from(id)
    }

    pub(crate) fn run_cascade(&mut self, id: ContainerId, generation: u64) -> Result<()> {
        match self.registry.get(id) {
            Some(record) if record.generation == generation => self.cascade_from(id),
            Some(_) => {
                self.trace
                    .timer_line(format!("[height] stale cascade #{}", id.0));
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Walks expanded ancestors that still hold a fixed clip and remeasures
    /// them, stopping at the first unconstrained (or collapsed) ancestor.
    pub(crate) fn cascade_from(&mut self, id: ContainerId) -> Result<()> {
        let mut cursor = self.registry.get(id).and_then(|r| r.parent);
        let mut updated = 0usize;
        while let Some(ancestor) = cursor {
            let Some(record) = self.registry.get(ancestor) else {
                break;
            };
            if !record.is_expanded() {
                break;
            }
            let HeightConstraint::Fixed(old_px) = record.constraint else {
                break;
            };
            let parent = record.parent;

            let measured = self.measure_natural(ancestor);
            if measured != old_px {
                self.apply_constraint(ancestor, HeightConstraint::Fixed(measured.max(1)))?;
                if let Some(record) = self.registry.get_mut(ancestor) {
                    if let HeightState::Expanding { target_px } = &mut record.height {
                        *target_px = measured;
                    }
                }
                updated += 1;
            }
            cursor = parent;
        }
        self.trace.toggle_line(format!(
            "[height] cascade from #{} updated={}",
            id.0, updated
        ));
        Ok(())
    }
}
