use super::*;

/// `h1`..`h6` to their level; anything else is `None`.
pub(crate) fn heading_level(tag_name: &str) -> Option<u8> {
    match tag_name.as_bytes() {
        [h, digit @ b'1'..=b'6'] if h.eq_ignore_ascii_case(&b'h') => Some(digit - b'0'),
        _ => None,
    }
}

pub(crate) fn class_list_contains(class_attr: Option<&str>, class_name: &str) -> bool {
    class_attr.is_some_and(|classes| classes.split_whitespace().any(|token| token == class_name))
}

/// Rewrites a `class` attribute so `class_name` is present or absent.
/// Existing tokens keep their order and new ones go last; `None` means the
/// attribute should be removed.
pub(crate) fn class_list_with(
    class_attr: Option<&str>,
    class_name: &str,
    present: bool,
) -> Option<String> {
    let mut tokens = class_attr
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>();
    if !present {
        tokens.retain(|token| *token != class_name);
    } else if !tokens.contains(&class_name) {
        tokens.push(class_name);
    }
    let joined = tokens.join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// Inline `style` declarations in source order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct InlineStyle {
    decls: Vec<(String, String)>,
}

impl InlineStyle {
    /// Splits on `;` outside quotes and parentheses. Later duplicates win
    /// but keep the position of the first occurrence.
    pub(crate) fn parse(style_attr: Option<&str>) -> Self {
        let mut style = Self::default();
        let Some(src) = style_attr else {
            return style;
        };

        let mut quote = None;
        let mut depth = 0usize;
        let mut start = 0usize;
        for (at, ch) in src.char_indices() {
            match (quote, ch) {
                (Some(open), _) if ch == open => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(ch),
                (None, '(') => depth += 1,
                (None, ')') => depth = depth.saturating_sub(1),
                (None, ';') if depth == 0 => {
                    style.push_raw(&src[start..at]);
                    start = at + 1;
                }
                _ => {}
            }
        }
        style.push_raw(&src[start..]);
        style
    }

    fn push_raw(&mut self, raw: &str) {
        if let Some((name, value)) = raw.split_once(':') {
            let name = name.trim();
            if !name.is_empty() {
                self.set(name, value.trim());
            }
        }
    }

    pub(crate) fn get(&self, property: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value.as_str())
    }

    /// An empty `value` removes the declaration.
    pub(crate) fn set(&mut self, property: &str, value: &str) {
        let property = property.to_ascii_lowercase();
        let existing = self.decls.iter().position(|(name, _)| *name == property);
        match (existing, value.is_empty()) {
            (Some(pos), true) => {
                self.decls.remove(pos);
            }
            (Some(pos), false) => self.decls[pos].1 = value.to_string(),
            (None, false) => self.decls.push((property, value.to_string())),
            (None, true) => {}
        }
    }

    /// Attribute value, or `None` once every declaration is gone.
    pub(crate) fn to_attr(&self) -> Option<String> {
        if self.decls.is_empty() {
            return None;
        }
        let parts = self
            .decls
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>();
        Some(parts.join(" "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Escape {
    Text,
    Attr,
}

pub(crate) fn push_escaped(out: &mut String, value: &str, mode: Escape) {
    for ch in value.chars() {
        match (ch, mode) {
            ('&', _) => out.push_str("&amp;"),
            ('<', _) => out.push_str("&lt;"),
            ('>', _) => out.push_str("&gt;"),
            ('"', Escape::Attr) => out.push_str("&quot;"),
            ('\u{00A0}', Escape::Text) => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/// Collapses runs of whitespace into single spaces and trims both ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters, with `...` appended when cut.
pub(crate) fn snippet(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}
