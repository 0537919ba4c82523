//! Deterministic collapsible outline transform for heading-based HTML.
//!
//! A [`Page`] parses a converter-produced HTML document, regroups the flat
//! heading/content sequence under its root container into nested
//! collapsible containers, and then drives them: per-tier toggles, batch
//! expand/collapse, keyboard activation and the max-height bookkeeping that
//! fakes "auto height" transitions. Deferred animation steps run on a
//! virtual clock that only moves when the caller advances it.
//!
//! ```
//! use collapsible_outline::Page;
//!
//! let mut page = Page::from_html(
//!     "<div class='content'><h2>Week 1</h2><p>Intro</p></div>",
//! )?;
//! page.transform()?;
//! page.assert_exists(".section .section-header")?;
//! # Ok::<(), collapsible_outline::Error>(())
//! ```

use std::collections::{HashMap, VecDeque};
use std::error::Error as StdError;
use std::fmt;

mod config;
mod dom;
mod dom_utils;
mod enhance;
mod height;
mod html;
mod layout;
pub mod outline;
mod page;
mod render;
mod scheduler;
mod selector;
mod text_match;
mod toggle;
mod trace;

pub use config::{OutlineConfig, PreamblePolicy};
pub use enhance::EnhanceReport;
pub use height::{HeightConstraint, HeightState};
pub use layout::LayoutMetrics;
pub use outline::{FlatItem, Grouping, ItemKind, OutlineNode, Tier};
pub use page::{Page, TransformReport};
pub use scheduler::PendingTimer;
pub use toggle::{Key, KeyOutcome, ToggleOutcome};

pub(crate) use dom::{Dom, NodeId};
pub(crate) use dom_utils::*;
pub(crate) use render::{ContainerId, ContainerRecord, ContainerRegistry};
pub(crate) use scheduler::Scheduler;
pub(crate) use trace::TraceState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    Dom(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    InvalidConfig(String),
    Regex(String),
    TimerStepLimit {
        limit: usize,
        now_ms: i64,
        pending: usize,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::Dom(msg) => write!(f, "dom error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Regex(msg) => write!(f, "regex error: {msg}"),
            Self::TimerStepLimit {
                limit,
                now_ms,
                pending,
            } => write!(
                f,
                "timer queue exceeded max steps: limit={limit}, now_ms={now_ms}, pending_tasks={pending}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}
