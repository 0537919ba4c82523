//! Heading-to-tree grouping, independent of any document model.
//!
//! [`group`] takes the flat, document-ordered children of a root container
//! and returns an owned outline. Content handles are moved into the tree, so
//! every non-heading item ends up in exactly one place: a node's `content`,
//! or the [`Grouping::preamble`] when it precedes the first section.

use std::iter::Peekable;

use crate::dom_utils::collapse_whitespace;

/// Nesting depth of a collapsible container, one per heading level 2–5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Section,
    Subsection,
    SubSubsection,
    Session,
}

impl Tier {
    pub const ALL: [Tier; 4] = [
        Tier::Section,
        Tier::Subsection,
        Tier::SubSubsection,
        Tier::Session,
    ];

    pub fn from_heading_level(level: u8) -> Option<Self> {
        match level {
            2 => Some(Tier::Section),
            3 => Some(Tier::Subsection),
            4 => Some(Tier::SubSubsection),
            5 => Some(Tier::Session),
            _ => None,
        }
    }

    pub fn heading_level(self) -> u8 {
        match self {
            Tier::Section => 2,
            Tier::Subsection => 3,
            Tier::SubSubsection => 4,
            Tier::Session => 5,
        }
    }

    /// Class-name stem used for the wrapper and its `-header`, `-content`
    /// and `-inner` parts.
    pub fn class_stem(self) -> &'static str {
        match self {
            Tier::Section => "section",
            Tier::Subsection => "subsection",
            Tier::SubSubsection => "subsubsection",
            Tier::Session => "session",
        }
    }

    /// Sections may skip straight to a sub-subsection; every other tier only
    /// owns the next one down.
    pub fn can_own(self, child: Tier) -> bool {
        matches!(
            (self, child),
            (Tier::Section, Tier::Subsection)
                | (Tier::Section, Tier::SubSubsection)
                | (Tier::Subsection, Tier::SubSubsection)
                | (Tier::SubSubsection, Tier::Session)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Heading(u8),
    Content,
}

/// One top-level child of the root container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatItem<T> {
    pub kind: ItemKind,
    /// Text content; only read for headings.
    pub text: String,
    pub handle: T,
}

impl<T> FlatItem<T> {
    pub fn heading(level: u8, text: impl Into<String>, handle: T) -> Self {
        Self {
            kind: ItemKind::Heading(level),
            text: text.into(),
            handle,
        }
    }

    pub fn content(handle: T) -> Self {
        Self {
            kind: ItemKind::Content,
            text: String::new(),
            handle,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.kind, ItemKind::Heading(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode<T> {
    pub tier: Tier,
    pub title: String,
    pub content: Vec<T>,
    pub children: Vec<OutlineNode<T>>,
}

impl<T> OutlineNode<T> {
    fn new(tier: Tier, title: String) -> Self {
        Self {
            tier,
            title,
            content: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Content items in this node and all of its descendants.
    pub fn content_count(&self) -> usize {
        self.content.len()
            + self
                .children
                .iter()
                .map(OutlineNode::content_count)
                .sum::<usize>()
    }

    /// This node plus all of its descendants.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(OutlineNode::node_count)
            .sum::<usize>()
    }

    pub fn child(&self, index: usize) -> Option<&OutlineNode<T>> {
        self.children.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping<T> {
    /// Text of the first non-empty level-1 heading.
    pub title: Option<String>,
    /// Content seen before any section heading.
    pub preamble: Vec<T>,
    pub sections: Vec<OutlineNode<T>>,
    /// Headings with no owning tier, kept as plain content.
    pub demoted_headings: usize,
}

impl<T> Grouping<T> {
    pub fn content_count(&self) -> usize {
        self.sections.iter().map(OutlineNode::content_count).sum()
    }

    pub fn node_count(&self) -> usize {
        self.sections.iter().map(OutlineNode::node_count).sum()
    }
}

/// Groups a flat heading/content sequence into an outline.
///
/// - `h1` sets the page title and is otherwise dropped;
/// - `h2` opens a section, closing everything below it;
/// - `h3` opens a subsection inside the current section;
/// - `h4` opens a sub-subsection inside the current subsection, or directly
///   inside the section when no subsection is open;
/// - `h5` opens a session inside the current sub-subsection;
/// - `h6` and non-heading items go to the innermost open node.
///
/// A heading whose tier has no open owner is demoted to plain content.
pub fn group<T, I>(items: I) -> Grouping<T>
where
    I: IntoIterator<Item = FlatItem<T>>,
{
    let mut grouper = Grouper {
        items: items.into_iter().peekable(),
        title: None,
        demoted: 0,
    };

    let mut preamble = Vec::new();
    let mut sections = Vec::new();
    while let Some(item) = grouper.items.next() {
        match item.kind {
            ItemKind::Heading(1) => grouper.take_title(&item.text),
            ItemKind::Heading(2) => sections.push(grouper.parse_node(Tier::Section, &item.text, &[])),
            ItemKind::Heading(level) if Tier::from_heading_level(level).is_some() => {
                grouper.demoted += 1;
                preamble.push(item.handle);
            }
            _ => preamble.push(item.handle),
        }
    }

    Grouping {
        title: grouper.title,
        preamble,
        sections,
        demoted_headings: grouper.demoted,
    }
}

struct Grouper<I: Iterator> {
    items: Peekable<I>,
    title: Option<String>,
    demoted: usize,
}

impl<T, I> Grouper<I>
where
    I: Iterator<Item = FlatItem<T>>,
{
    fn take_title(&mut self, text: &str) {
        let title = collapse_whitespace(text);
        if self.title.is_none() && !title.is_empty() {
            self.title = Some(title);
        }
    }

    /// Consumes items until a heading that an ancestor (or the forest, for
    /// `h2`) must own instead.
    fn parse_node(&mut self, tier: Tier, heading_text: &str, ancestors: &[Tier]) -> OutlineNode<T> {
        let mut node = OutlineNode::new(tier, collapse_whitespace(heading_text));
        let mut path = ancestors.to_vec();
        path.push(tier);

        loop {
            let kind = match self.items.peek() {
                Some(item) => item.kind,
                None => break,
            };

            let heading_tier = match kind {
                ItemKind::Heading(level) => Tier::from_heading_level(level),
                ItemKind::Content => None,
            };

            if kind == ItemKind::Heading(1) {
                if let Some(item) = self.items.next() {
                    self.take_title(&item.text);
                }
                continue;
            }

            let Some(child_tier) = heading_tier else {
                if let Some(item) = self.items.next() {
                    node.content.push(item.handle);
                }
                continue;
            };

            if tier.can_own(child_tier) {
                if let Some(item) = self.items.next() {
                    let child = self.parse_node(child_tier, &item.text, &path);
                    node.children.push(child);
                }
                continue;
            }

            if child_tier == Tier::Section
                || ancestors.iter().any(|ancestor| ancestor.can_own(child_tier))
            {
                break;
            }

            if let Some(item) = self.items.next() {
                self.demoted += 1;
                node.content.push(item.handle);
            }
        }

        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(level: u8, text: &str) -> FlatItem<String> {
        FlatItem::heading(level, text, format!("h{level}:{text}"))
    }

    fn c(text: &str) -> FlatItem<String> {
        FlatItem::content(text.to_string())
    }

    #[test]
    fn groups_week_and_day_into_two_tiers() {
        let grouping = group(vec![
            h(1, "Syllabus"),
            h(2, "Week 1"),
            c("<p>Intro</p>"),
            h(3, "Monday"),
            c("<ul>Read ch.1</ul>"),
        ]);

        assert_eq!(grouping.title.as_deref(), Some("Syllabus"));
        assert_eq!(grouping.sections.len(), 1);
        let week = &grouping.sections[0];
        assert_eq!(week.tier, Tier::Section);
        assert_eq!(week.title, "Week 1");
        assert_eq!(week.content, vec!["<p>Intro</p>".to_string()]);
        assert_eq!(week.children.len(), 1);
        let monday = &week.children[0];
        assert_eq!(monday.tier, Tier::Subsection);
        assert_eq!(monday.title, "Monday");
        assert_eq!(monday.content, vec!["<ul>Read ch.1</ul>".to_string()]);
    }

    #[test]
    fn four_tiers_nest_and_sessions_collect_content() {
        let grouping = group(vec![
            h(2, "Unit"),
            h(3, "Week"),
            h(4, "Day"),
            h(5, "Morning"),
            c("a"),
            h(6, "aside"),
            h(5, "Afternoon"),
            c("b"),
            h(4, "Next day"),
            c("c"),
        ]);

        let week = &grouping.sections[0].children[0];
        assert_eq!(week.children.len(), 2);
        let day = &week.children[0];
        assert_eq!(day.tier, Tier::SubSubsection);
        assert_eq!(day.children.len(), 2);
        assert_eq!(day.children[0].tier, Tier::Session);
        assert_eq!(day.children[0].content, vec!["a", "h6:aside"]);
        assert_eq!(day.children[1].content, vec!["b"]);
        assert_eq!(week.children[1].content, vec!["c"]);
    }

    #[test]
    fn h4_without_subsection_attaches_to_section() {
        let grouping = group(vec![h(2, "Unit"), c("x"), h(4, "Lab"), c("y"), h(3, "Week"), c("z")]);

        let unit = &grouping.sections[0];
        assert_eq!(unit.content, vec!["x"]);
        assert_eq!(unit.children[0].tier, Tier::SubSubsection);
        assert_eq!(unit.children[0].content, vec!["y"]);
        assert_eq!(unit.children[1].tier, Tier::Subsection);
        assert_eq!(unit.children[1].content, vec!["z"]);
    }

    #[test]
    fn orphan_headings_are_demoted_not_lost() {
        let grouping = group(vec![
            h(3, "Stray"),
            c("before"),
            h(2, "Unit"),
            h(5, "No day open"),
            c("after"),
        ]);

        assert_eq!(grouping.preamble, vec!["h3:Stray", "before"]);
        assert_eq!(grouping.sections[0].content, vec!["h5:No day open", "after"]);
        assert_eq!(grouping.demoted_headings, 2);
    }

    #[test]
    fn later_h1_does_not_close_tiers_or_replace_title() {
        let grouping = group(vec![h(1, "  First  "), h(2, "Unit"), h(1, "Second"), c("kept")]);

        assert_eq!(grouping.title.as_deref(), Some("First"));
        assert_eq!(grouping.sections[0].content, vec!["kept"]);
    }

    #[test]
    fn h2_closes_every_open_tier() {
        let grouping = group(vec![
            h(2, "A"),
            h(3, "A.1"),
            h(4, "A.1.a"),
            h(5, "s"),
            h(2, "B"),
            c("b"),
        ]);

        assert_eq!(grouping.sections.len(), 2);
        assert_eq!(grouping.sections[1].content, vec!["b"]);
        assert_eq!(grouping.node_count(), 5);
    }

    #[test]
    fn heading_titles_collapse_whitespace() {
        let grouping = group(vec![h(2, "\n  Week\t 1 \n")]);
        assert_eq!(grouping.sections[0].title, "Week 1");
    }
}
