use super::*;

/// Box metrics for the deterministic block layout used to measure natural
/// heights. Values are CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMetrics {
    pub line_height_px: i64,
    pub chars_per_line: usize,
    pub header_height_px: i64,
    /// Vertical margin added below every block-level element.
    pub block_gap_px: i64,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            line_height_px: 24,
            chars_per_line: 80,
            header_height_px: 40,
            block_gap_px: 8,
        }
    }
}

impl LayoutMetrics {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.line_height_px <= 0 || self.header_height_px <= 0 {
            return Err(Error::InvalidConfig(
                "line and header heights must be positive".into(),
            ));
        }
        if self.chars_per_line == 0 {
            return Err(Error::InvalidConfig("chars_per_line must be positive".into()));
        }
        if self.block_gap_px < 0 {
            return Err(Error::InvalidConfig("block_gap_px must not be negative".into()));
        }
        Ok(())
    }

    fn text_height(&self, text: &str) -> i64 {
        let chars = collapse_whitespace(text).chars().count();
        if chars == 0 {
            return 0;
        }
        let lines = chars.div_ceil(self.chars_per_line);
        lines as i64 * self.line_height_px
    }
}

/// How the measurer should treat a particular element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LayoutHint {
    Flow,
    Header,
    Clipped(HeightConstraint),
}

pub(crate) struct Measurer<'a, F> {
    dom: &'a Dom,
    metrics: LayoutMetrics,
    hint: F,
}

impl<'a, F> Measurer<'a, F>
where
    F: Fn(NodeId) -> LayoutHint,
{
    pub(crate) fn new(dom: &'a Dom, metrics: LayoutMetrics, hint: F) -> Self {
        Self { dom, metrics, hint }
    }

    /// Height of `node`'s content with `node`'s own clip removed. Clips on
    /// descendants still apply.
    pub(crate) fn natural_height(&self, node: NodeId) -> i64 {
        stacker::maybe_grow(64 * 1024, 4 * 1024 * 1024, || {
            let mut total = 0i64;
            let mut inline_run = String::new();
            for child in self.dom.children(node) {
                if let Some(text) = self.dom.text(*child) {
                    inline_run.push_str(text);
                    continue;
                }
                let tag = self.dom.tag_name(*child).unwrap_or_default();
                if html::is_phrasing_tag(tag) && (self.hint)(*child) == LayoutHint::Flow {
                    inline_run.push(' ');
                    inline_run.push_str(&self.dom.text_content(*child));
                    continue;
                }
                total += self.metrics.text_height(&inline_run);
                inline_run.clear();
                total += self.box_height(*child);
            }
            total + self.metrics.text_height(&inline_run)
        })
    }

    /// Rendered height of a block element, honouring its clip.
    pub(crate) fn box_height(&self, node: NodeId) -> i64 {
        if self
            .dom
            .style(node, "display")
            .is_some_and(|display| display.eq_ignore_ascii_case("none"))
        {
            return 0;
        }
        match (self.hint)(node) {
            LayoutHint::Header => self.metrics.header_height_px,
            LayoutHint::Clipped(HeightConstraint::Zero) => 0,
            LayoutHint::Clipped(HeightConstraint::Fixed(px)) => px,
            LayoutHint::Clipped(HeightConstraint::Unconstrained) => self.natural_height(node),
            LayoutHint::Flow => self.natural_height(node) + self.metrics.block_gap_px,
        }
    }
}
