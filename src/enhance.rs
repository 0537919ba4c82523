use super::*;
use crate::text_match::contains_all;

const READING_LIST_CLASS: &str = "reading-list";
const DEADLINES_CLASS: &str = "deadlines";

/// Counts of lists touched by one [`Page::enhance`] pass. Lists handled by an
/// earlier pass are not counted again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnhanceReport {
    pub reading_lists: usize,
    pub deadline_lists: usize,
}

impl Page {
    /// Wraps reading lists and marks deadline lists under the root container.
    /// Safe to call more than once.
    pub fn enhance(&mut self) -> Result<EnhanceReport> {
        let Some(root) = self.locate_root()? else {
            self.trace.warn(format!(
                "enhance: root container not found: {}",
                self.config.root_selector
            ));
            return Ok(EnhanceReport::default());
        };

        let report = EnhanceReport {
            reading_lists: self.wrap_reading_lists(root)?,
            deadline_lists: self.mark_deadline_lists(root)?,
        };
        self.trace.line(format!(
            "[enhance] reading_lists={} deadline_lists={}",
            report.reading_lists, report.deadline_lists
        ));
        Ok(report)
    }

    fn wrap_reading_lists(&mut self, root: NodeId) -> Result<usize> {
        let mut wrapped = 0;
        for strong in self.dom.query_selector_all_from(root, "strong")? {
            if !contains_all(&self.dom.text_content(strong), &["reading", ":"]) {
                continue;
            }
            let Some(list) = self
                .dom
                .parent(strong)
                .and_then(|parent| self.dom.next_element_sibling(parent))
            else {
                continue;
            };
            if !self.dom.has_tag(list, "ul") {
                continue;
            }
            let Some(list_parent) = self.dom.parent(list) else {
                continue;
            };
            if self.dom.has_class(list_parent, READING_LIST_CLASS) {
                continue;
            }

            let wrapper = self.dom.create_detached_element("div");
            self.dom.set_class(wrapper, READING_LIST_CLASS, true)?;
            self.dom.insert_before(list_parent, wrapper, list)?;
            self.dom.append_child(wrapper, list)?;
            wrapped += 1;
        }
        Ok(wrapped)
    }

    fn mark_deadline_lists(&mut self, root: NodeId) -> Result<usize> {
        let mut runs = Vec::new();

        for record in self.registry.records() {
            if record.tier == Tier::Section {
                continue;
            }
            if self
                .deadline_matcher
                .is_match(&self.dom.text_content(record.title))?
            {
                runs.push(self.dom.children(record.inner).to_vec());
            }
        }

        for heading in self.dom.descendant_elements(root) {
            if !self
                .dom
                .heading_level(heading)
                .is_some_and(|level| (3..=5).contains(&level))
            {
                continue;
            }
            if !self.deadline_matcher.is_match(&self.dom.text_content(heading))? {
                continue;
            }
            let Some(parent) = self.dom.parent(heading) else {
                continue;
            };
            let siblings = self.dom.children(parent);
            let Some(pos) = siblings.iter().position(|node| *node == heading) else {
                continue;
            };
            runs.push(siblings[pos + 1..].to_vec());
        }

        let mut marked = 0;
        for run in runs {
            for node in run {
                if self.dom.element(node).is_none() {
                    continue;
                }
                if self.dom.heading_level(node).is_some()
                    || self.registry.by_wrapper(node).is_some()
                {
                    break;
                }
                if self.dom.has_tag(node, "ul") && !self.dom.has_class(node, DEADLINES_CLASS)
                {
                    self.dom.set_class(node, DEADLINES_CLASS, true)?;
                    marked += 1;
                }
            }
        }
        Ok(marked)
    }
}
