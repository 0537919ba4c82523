use super::*;

/// What happens to content that appears before the first section heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreamblePolicy {
    /// Discard it, as a converter-produced page has nothing meaningful there.
    #[default]
    Drop,
    /// Keep it at the top of the root container, ahead of the first section.
    Keep,
}

/// Knobs for a [`Page`](crate::Page). `Default` matches the stylesheet the
/// outline markup is written against.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineConfig {
    pub root_selector: String,
    /// Element whose text receives the page title taken from the `h1`.
    pub title_selector: Option<String>,
    /// Duration of the stylesheet's max-height transition.
    pub transition_ms: i64,
    /// Extra delay given to a parent whose descendants were force-expanded.
    pub cascade_stagger_ms: i64,
    pub enhance_delay_ms: i64,
    pub auto_expand_first: bool,
    pub preamble: PreamblePolicy,
    pub collapsed_glyph: String,
    pub expanded_glyph: String,
    pub deadline_keywords: Vec<String>,
    pub layout: LayoutMetrics,
    pub timer_step_limit: usize,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            root_selector: ".content".into(),
            title_selector: Some("header .title".into()),
            transition_ms: 300,
            cascade_stagger_ms: 50,
            enhance_delay_ms: 100,
            auto_expand_first: true,
            preamble: PreamblePolicy::Drop,
            collapsed_glyph: "▼".into(),
            expanded_glyph: "▲".into(),
            deadline_keywords: vec![
                "deadline".into(),
                "due date".into(),
                "important dates".into(),
            ],
            layout: LayoutMetrics::default(),
            timer_step_limit: 10_000,
        }
    }
}

impl OutlineConfig {
    pub fn with_root_selector(mut self, selector: impl Into<String>) -> Self {
        self.root_selector = selector.into();
        self
    }

    pub fn with_title_selector(mut self, selector: Option<String>) -> Self {
        self.title_selector = selector;
        self
    }

    pub fn with_transition_ms(mut self, transition_ms: i64) -> Self {
        self.transition_ms = transition_ms;
        self
    }

    pub fn with_cascade_stagger_ms(mut self, stagger_ms: i64) -> Self {
        self.cascade_stagger_ms = stagger_ms;
        self
    }

    pub fn with_enhance_delay_ms(mut self, delay_ms: i64) -> Self {
        self.enhance_delay_ms = delay_ms;
        self
    }

    pub fn with_auto_expand_first(mut self, enabled: bool) -> Self {
        self.auto_expand_first = enabled;
        self
    }

    pub fn with_preamble(mut self, policy: PreamblePolicy) -> Self {
        self.preamble = policy;
        self
    }

    pub fn with_glyphs(mut self, collapsed: impl Into<String>, expanded: impl Into<String>) -> Self {
        self.collapsed_glyph = collapsed.into();
        self.expanded_glyph = expanded.into();
        self
    }

    pub fn with_deadline_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deadline_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_layout(mut self, layout: LayoutMetrics) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_timer_step_limit(mut self, max_steps: usize) -> Self {
        self.timer_step_limit = max_steps;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.root_selector.trim().is_empty() {
            return Err(Error::InvalidConfig("root_selector must not be empty".into()));
        }
        if self
            .title_selector
            .as_deref()
            .is_some_and(|selector| selector.trim().is_empty())
        {
            return Err(Error::InvalidConfig(
                "title_selector must not be empty when set".into(),
            ));
        }
        for (name, value) in [
            ("transition_ms", self.transition_ms),
            ("cascade_stagger_ms", self.cascade_stagger_ms),
            ("enhance_delay_ms", self.enhance_delay_ms),
        ] {
            if value < 0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} requires non-negative milliseconds (got {value})"
                )));
            }
        }
        if self.collapsed_glyph.is_empty() || self.expanded_glyph.is_empty() {
            return Err(Error::InvalidConfig("indicator glyphs must not be empty".into()));
        }
        if self.collapsed_glyph == self.expanded_glyph {
            return Err(Error::InvalidConfig(
                "collapsed and expanded glyphs must differ".into(),
            ));
        }
        if self
            .deadline_keywords
            .iter()
            .all(|keyword| keyword.trim().is_empty())
        {
            return Err(Error::InvalidConfig(
                "deadline_keywords requires at least one keyword".into(),
            ));
        }
        if self.timer_step_limit == 0 {
            return Err(Error::InvalidConfig(
                "timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.layout.validate()
    }
}
