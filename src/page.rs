use super::*;
use crate::render::render_outline;
use crate::text_match::KeywordMatcher;

/// Deferred work queued on the page's virtual clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Deferred {
    Settle {
        container: ContainerId,
        generation: u64,
    },
    Cascade {
        container: ContainerId,
        generation: u64,
    },
    Enhance,
}

/// Summary of one [`Page::transform`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// False when the root container could not be found; nothing was touched.
    pub transformed: bool,
    pub title: Option<String>,
    pub sections: usize,
    pub containers: usize,
    /// Content items moved into containers.
    pub content_items: usize,
    /// Pre-heading items kept at the top of the root.
    pub preamble: usize,
    /// Pre-heading items discarded.
    pub dropped: usize,
    pub demoted_headings: usize,
}

/// An HTML document with a collapsible outline driven on virtual time.
#[derive(Debug)]
pub struct Page {
    pub(crate) dom: Dom,
    pub(crate) config: OutlineConfig,
    pub(crate) registry: ContainerRegistry,
    pub(crate) scheduler: Scheduler<Deferred>,
    pub(crate) trace: TraceState,
    pub(crate) active_element: Option<NodeId>,
    pub(crate) deadline_matcher: KeywordMatcher,
    title: Option<String>,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::with_config(html, OutlineConfig::default())
    }

    pub fn with_config(html: &str, config: OutlineConfig) -> Result<Self> {
        config.validate()?;
        let dom = html::parse_html(html)?;
        let deadline_matcher = KeywordMatcher::new(&config.deadline_keywords)?;
        Ok(Self {
            dom,
            scheduler: Scheduler::new(config.timer_step_limit),
            config,
            registry: ContainerRegistry::default(),
            trace: TraceState::default(),
            active_element: None,
            deadline_matcher,
            title: None,
        })
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    /// Page title taken from the first non-empty `h1` by the last transform.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub(crate) fn locate_root(&self) -> Result<Option<NodeId>> {
        self.dom.query_selector(&self.config.root_selector)
    }

    /// Regroups the root container's children into collapsible containers.
    ///
    /// Calling it again first flattens the previous outline back into
    /// headings and content, so the result is rebuilt in full.
    pub fn transform(&mut self) -> Result<TransformReport> {
        let Some(root) = self.locate_root()? else {
            self.trace.warn(format!(
                "root container not found: {}",
                self.config.root_selector
            ));
            return Ok(TransformReport::default());
        };

        if !self.registry.is_empty() {
            self.flatten_outline(root)?;
        }

        let items = self
            .dom
            .children(root)
            .to_vec()
            .into_iter()
            .filter_map(|child| self.flat_item(child))
            .collect::<Vec<_>>();
        let grouping = outline::group(items);

        // A rebuilt outline no longer has its h1; keep the earlier title.
        let title = grouping.title.clone().or_else(|| self.title.clone());
        let sections = grouping.sections.len();
        let content_items = grouping.content_count();
        let demoted_headings = grouping.demoted_headings;

        if let (Some(title), Some(selector)) = (&title, &self.config.title_selector) {
            match self.dom.query_selector(selector)? {
                Some(target) => self.dom.set_text_content(target, title)?,
                None => self
                    .trace
                    .line(format!("[transform] no title target for {selector}")),
            }
        }

        let output = render_outline(&mut self.dom, root, grouping, &self.config)?;
        if output.preamble_dropped > 0 {
            self.trace.line(format!(
                "[transform] dropped {} item(s) before the first section",
                output.preamble_dropped
            ));
        }
        self.registry = output.registry;
        self.scheduler.clear_all();
        self.active_element = self
            .active_element
            .filter(|node| self.dom.is_connected(*node));
        self.title = title.clone();

        let report = TransformReport {
            transformed: true,
            title,
            sections,
            containers: self.registry.len(),
            content_items,
            preamble: output.preamble_kept,
            dropped: output.preamble_dropped,
            demoted_headings,
        };
        self.trace.line(format!(
            "[transform] sections={} containers={} content={} demoted={}",
            report.sections, report.containers, report.content_items, report.demoted_headings
        ));

        if self.config.auto_expand_first && !self.registry.is_empty() {
            self.expand_container(ContainerId(0))?;
        }
        self.scheduler
            .schedule(self.config.enhance_delay_ms, Deferred::Enhance);

        Ok(report)
    }

    fn flat_item(&self, node: NodeId) -> Option<FlatItem<NodeId>> {
        if self.dom.is_text(node) {
            let text = self.dom.text_content(node);
            if text.trim().is_empty() {
                return None;
            }
            return Some(FlatItem::content(node));
        }
        self.dom.element(node)?;
        match self.dom.heading_level(node) {
            Some(level) => Some(FlatItem::heading(
                level,
                self.dom.text_content(node),
                node,
            )),
            None => Some(FlatItem::content(node)),
        }
    }

    /// Turns each rendered container back into its heading followed by its
    /// content, in document order.
    fn flatten_outline(&mut self, root: NodeId) -> Result<()> {
        let flat = self.flatten_children(root);
        self.dom.clear_children(root);
        for node in flat {
            self.dom.append_child(root, node)?;
        }
        Ok(())
    }

    fn flatten_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in self.dom.children(parent).to_vec() {
            let Some(record) = self
                .registry
                .by_wrapper(child)
                .and_then(|id| self.registry.get(id))
                .cloned()
            else {
                out.push(child);
                continue;
            };
            let heading = self
                .dom
                .create_detached_element(&format!("h{}", record.tier.heading_level()));
            let title = self.dom.text_content(record.title);
            if !title.is_empty() {
                self.dom.create_text(heading, title);
            }
            out.push(heading);
            out.extend(self.flatten_children(record.inner));
        }
        out
    }

    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms()
    }

    pub fn clear_timer(&mut self, timer_id: i64) -> bool {
        let existed = self.scheduler.clear(timer_id);
        self.trace.timer_line(format!(
            "[timer] clear id={timer_id} existed={existed}"
        ));
        existed
    }

    pub fn clear_all_timers(&mut self) -> usize {
        let cleared = self.scheduler.clear_all();
        self.trace
            .timer_line(format!("[timer] clear_all cleared={cleared}"));
        cleared
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.scheduler.pending(|task| self.deferred_label(task))
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::InvalidConfig(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.scheduler.set_step_limit(max_steps);
        self.config.timer_step_limit = max_steps;
        Ok(())
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<usize> {
        if delta_ms < 0 {
            return Err(Error::InvalidConfig(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.scheduler.now_ms();
        self.scheduler.set_now(from.saturating_add(delta_ms));
        let ran = self.run_timer_queue(Some(self.scheduler.now_ms()))?;
        self.trace.timer_line(format!(
            "[timer] advance delta_ms={} from={} to={} ran_due={}",
            delta_ms,
            from,
            self.scheduler.now_ms(),
            ran
        ));
        Ok(ran)
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<usize> {
        let from = self.scheduler.now_ms();
        if target_ms < from {
            return Err(Error::InvalidConfig(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={from})"
            )));
        }
        self.scheduler.set_now(target_ms);
        let ran = self.run_timer_queue(Some(target_ms))?;
        self.trace.timer_line(format!(
            "[timer] advance_to from={} to={} ran_due={}",
            from, target_ms, ran
        ));
        Ok(ran)
    }

    /// Runs every queued step, moving the clock to each one's deadline.
    pub fn flush(&mut self) -> Result<usize> {
        let from = self.scheduler.now_ms();
        let ran = self.run_timer_queue(None)?;
        self.trace.timer_line(format!(
            "[timer] flush from={} to={} ran={}",
            from,
            self.scheduler.now_ms(),
            ran
        ));
        Ok(ran)
    }

    pub fn run_next_timer(&mut self) -> Result<bool> {
        let Some((id, task)) = self.scheduler.pop_next(None) else {
            self.trace.timer_line("[timer] run_next none".into());
            return Ok(false);
        };
        self.run_deferred(id, task)?;
        Ok(true)
    }

    fn run_timer_queue(&mut self, due_limit: Option<i64>) -> Result<usize> {
        let mut steps = 0usize;
        while let Some((id, task)) = self.scheduler.pop_next(due_limit) {
            steps += 1;
            if steps > self.scheduler.step_limit() {
                return Err(self.scheduler.step_limit_error());
            }
            self.run_deferred(id, task)?;
        }
        Ok(steps)
    }

    fn run_deferred(&mut self, id: i64, task: Deferred) -> Result<()> {
        self.trace.timer_line(format!(
            "[timer] run id={} task={} now_ms={}",
            id,
            self.deferred_label(&task),
            self.scheduler.now_ms()
        ));
        match task {
            Deferred::Settle {
                container,
                generation,
            } => self.settle(container, generation),
            Deferred::Cascade {
                container,
                generation,
            } => self.run_cascade(container, generation),
            Deferred::Enhance => self.enhance().map(|_| ()),
        }
    }

    fn deferred_label(&self, task: &Deferred) -> String {
        let describe = |container: &ContainerId| {
            let stem = self
                .registry
                .get(*container)
                .map(|record| record.tier.class_stem())
                .unwrap_or("container");
            format!("{stem}#{}", container.0)
        };
        match task {
            Deferred::Settle { container, .. } => format!("settle:{}", describe(container)),
            Deferred::Cascade { container, .. } => format!("cascade:{}", describe(container)),
            Deferred::Enhance => "enhance".into(),
        }
    }

    /// Serialized document.
    pub fn html(&self) -> String {
        self.dom.dump_node(self.dom.root)
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.dom.query_selector_all(selector)?.len())
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn assert_class(&self, selector: &str, class_name: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.has_class(target, class_name);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("class {class_name} present={expected}"),
                actual: format!("present={actual}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_style(&self, selector: &str, property: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.style(target, property).unwrap_or_default();
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("{property}: {expected}"),
                actual: format!("{property}: {actual}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub(crate) fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    pub(crate) fn node_snippet(&self, node_id: NodeId) -> String {
        snippet(&self.dom.dump_node(node_id), 200)
    }
}
