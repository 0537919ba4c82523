use super::*;
use std::collections::BTreeMap;

/// Block tags whose start implicitly ends an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

const PHRASING: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "i", "img", "kbd",
    "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var", "wbr",
];

const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const NAMED_REFERENCES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
    ("hellip", '\u{2026}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("ldquo", '\u{201C}'),
    ("rdquo", '\u{201D}'),
    ("laquo", '\u{00AB}'),
    ("raquo", '\u{00BB}'),
    ("middot", '\u{00B7}'),
    ("times", '\u{00D7}'),
    ("deg", '\u{00B0}'),
    ("copy", '\u{00A9}'),
    ("reg", '\u{00AE}'),
    ("trade", '\u{2122}'),
    ("euro", '\u{20AC}'),
    ("pound", '\u{00A3}'),
    ("larr", '\u{2190}'),
    ("rarr", '\u{2192}'),
];

pub(crate) fn is_phrasing_tag(tag: &str) -> bool {
    PHRASING.contains(&tag)
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    VOID.contains(&tag)
}

pub(crate) fn is_raw_text_tag(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style")
}

/// Parses converter output (a full document or a fragment) into a [`Dom`].
///
/// Recovery follows the browser rules that matter for heading-based
/// documents: an end tag closes up to its nearest open match and is ignored
/// when nothing matches, `<p>` and `<li>` close implicitly, and `script` /
/// `style` bodies are kept verbatim. An unterminated comment, tag or
/// raw-text element is an error.
pub(crate) fn parse_html(src: &str) -> Result<Dom> {
    let mut builder = TreeBuilder::new();
    let mut cursor = Cursor { src, pos: 0 };

    while !cursor.at_end() {
        if cursor.eat("<!--") {
            cursor.skip_past("-->", "unclosed HTML comment")?;
        } else if cursor.starts_with("</") && cursor.is_tag_open() {
            let tag = cursor.end_tag()?;
            builder.close(&tag);
        } else if (cursor.starts_with("<!") || cursor.starts_with("<?")) && cursor.is_tag_open() {
            cursor.skip_past(">", "unclosed declaration")?;
        } else if cursor.starts_with("<") && cursor.is_tag_open() {
            let start = cursor.start_tag()?;
            let node = builder.open(&start);
            if is_raw_text_tag(&start.name) && !start.self_closing {
                let body = cursor.raw_text_until_end_of(&start.name)?;
                if !body.is_empty() {
                    builder.dom.create_text(node, body.to_string());
                }
                cursor.end_tag()?;
            }
        } else {
            // A '<' that cannot open a tag is text, as in "a < b".
            let text = cursor.text_run();
            builder.text(&decode_character_references(text));
        }
    }

    Ok(builder.dom)
}

struct StartTag {
    name: String,
    attrs: BTreeMap<String, String>,
    self_closing: bool,
}

struct TreeBuilder {
    dom: Dom,
    open: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        let dom = Dom::new();
        let open = vec![dom.root];
        Self { dom, open }
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.dom.root)
    }

    fn open(&mut self, tag: &StartTag) -> NodeId {
        if CLOSES_PARAGRAPH.contains(&tag.name.as_str()) {
            self.close_innermost_paragraph();
        }
        if tag.name == "li" {
            self.close_open_list_item();
        }
        let parent = self.current();
        let node = self
            .dom
            .create_element(parent, tag.name.clone(), tag.attrs.clone());
        if !tag.self_closing && !is_void_tag(&tag.name) && !is_raw_text_tag(&tag.name) {
            self.open.push(node);
        }
        node
    }

    /// Pops through the nearest open element named `tag`. Stray end tags
    /// are dropped.
    fn close(&mut self, tag: &str) {
        let matched = self
            .open
            .iter()
            .skip(1)
            .rposition(|node| self.dom.has_tag(*node, tag));
        if let Some(index) = matched {
            self.open.truncate(index + 1);
        }
    }

    /// Closes an open `<p>` only when nothing but phrasing content is open
    /// inside it.
    fn close_innermost_paragraph(&mut self) {
        let Some(index) = self.open.iter().rposition(|node| self.dom.has_tag(*node, "p")) else {
            return;
        };
        if index == 0 {
            return;
        }
        let only_phrasing_inside = self.open[index + 1..]
            .iter()
            .all(|node| self.dom.tag_name(*node).is_some_and(is_phrasing_tag));
        if only_phrasing_inside {
            self.open.truncate(index);
        }
    }

    /// A new `<li>` closes the previous one in the same list.
    fn close_open_list_item(&mut self) {
        for index in (1..self.open.len()).rev() {
            let node = self.open[index];
            if self.dom.has_tag(node, "li") {
                self.open.truncate(index);
                return;
            }
            if self.dom.has_tag(node, "ul") || self.dom.has_tag(node, "ol") {
                return;
            }
        }
    }

    fn text(&mut self, text: &str) {
        if !text.is_empty() {
            let parent = self.current();
            self.dom.push_text(parent, text);
        }
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn eat(&mut self, prefix: &str) -> bool {
        let matched = self.starts_with(prefix);
        if matched {
            self.pos += prefix.len();
        }
        matched
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + offset).copied()
    }

    /// Whether the `<` under the cursor starts markup rather than text.
    fn is_tag_open(&self) -> bool {
        match self.peek_byte(1) {
            Some(b'/') => self.peek_byte(2).is_some_and(|b| b.is_ascii_alphabetic()),
            Some(b'!' | b'?') => true,
            Some(b) => b.is_ascii_alphabetic(),
            None => false,
        }
    }

    fn skip_past(&mut self, needle: &str, unclosed: &str) -> Result<()> {
        let end = self
            .rest()
            .find(needle)
            .ok_or_else(|| Error::HtmlParse(unclosed.into()))?;
        self.pos += end + needle.len();
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start_matches(|ch: char| ch.is_ascii_whitespace());
        self.pos = self.src.len() - trimmed.len();
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|ch: char| !keep(ch)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Text up to the next real tag opener. Always consumes at least one
    /// character.
    fn text_run(&mut self) -> &'a str {
        let start = self.pos;
        self.pos += self.rest().chars().next().map_or(0, char::len_utf8);
        while !self.at_end() && !(self.starts_with("<") && self.is_tag_open()) {
            self.pos += 1;
            while !self.src.is_char_boundary(self.pos) {
                self.pos += 1;
            }
        }
        &self.src[start..self.pos]
    }

    fn tag_name(&mut self) -> String {
        self.take_while(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
            .to_ascii_lowercase()
    }

    fn start_tag(&mut self) -> Result<StartTag> {
        self.pos += 1;
        let name = self.tag_name();
        if name.is_empty() {
            return Err(Error::HtmlParse("empty tag name".into()));
        }

        let mut attrs = BTreeMap::new();
        loop {
            self.skip_whitespace();
            if self.at_end() {
                return Err(Error::HtmlParse(format!("unclosed start tag <{name}>")));
            }
            if self.eat(">") {
                return Ok(StartTag {
                    name,
                    attrs,
                    self_closing: false,
                });
            }
            if self.eat("/>") {
                return Ok(StartTag {
                    name,
                    attrs,
                    self_closing: true,
                });
            }
            if self.eat("/") {
                continue;
            }

            let attr_name = self
                .take_while(|ch| {
                    !(ch.is_ascii_whitespace() || matches!(ch, '=' | '>' | '/' | '"' | '\''))
                })
                .to_ascii_lowercase();
            if attr_name.is_empty() {
                return Err(Error::HtmlParse(format!("invalid attribute name in <{name}>")));
            }
            self.skip_whitespace();
            let value = if self.eat("=") {
                self.skip_whitespace();
                self.attr_value()?
            } else {
                String::new()
            };
            // First occurrence wins, as in browsers.
            attrs.entry(attr_name).or_insert(value);
        }
    }

    fn attr_value(&mut self) -> Result<String> {
        match self.peek_byte(0) {
            None => Err(Error::HtmlParse("missing attribute value".into())),
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let quote = char::from(quote);
                let value = self.take_while(|ch| ch != quote);
                if !self.eat(&quote.to_string()) {
                    return Err(Error::HtmlParse("unclosed quoted attribute value".into()));
                }
                Ok(decode_character_references(value))
            }
            Some(_) => {
                let start = self.pos;
                while !self.at_end()
                    && !self.starts_with("/>")
                    && !self.rest().starts_with(|ch: char| ch.is_ascii_whitespace() || ch == '>')
                {
                    self.pos += self.rest().chars().next().map_or(1, char::len_utf8);
                }
                Ok(decode_character_references(&self.src[start..self.pos]))
            }
        }
    }

    fn end_tag(&mut self) -> Result<String> {
        if !self.eat("</") {
            return Err(Error::HtmlParse("expected end tag".into()));
        }
        self.skip_whitespace();
        let name = self.tag_name();
        self.skip_past(">", "unclosed end tag")?;
        Ok(name)
    }

    /// Body of a raw-text element; leaves the cursor on its end tag.
    fn raw_text_until_end_of(&mut self, tag: &str) -> Result<&'a str> {
        let needle = format!("</{tag}");
        let rest = self.rest();
        let end = rest
            .char_indices()
            .map(|(at, _)| at)
            .find(|at| {
                rest.get(*at..*at + needle.len())
                    .is_some_and(|window| window.eq_ignore_ascii_case(&needle))
            })
            .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
        self.pos += end;
        Ok(&rest[..end])
    }
}

/// Decodes `&name;`, `&#N;` and `&#xN;`. Unknown references stay as
/// written.
pub(crate) fn decode_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp + 1..];
        let decoded = rest
            .split_once(';')
            .and_then(|(reference, tail)| Some((resolve_reference(reference)?, tail)));
        match decoded {
            Some((ch, tail)) => {
                out.push(ch);
                rest = tail;
            }
            None => out.push('&'),
        }
    }
    out.push_str(rest);
    out
}

fn resolve_reference(reference: &str) -> Option<char> {
    let Some(numeric) = reference.strip_prefix('#') else {
        return NAMED_REFERENCES
            .iter()
            .find(|(name, _)| *name == reference)
            .map(|(_, ch)| *ch);
    };
    let codepoint = match numeric.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => numeric.parse::<u32>().ok()?,
    };
    char::from_u32(codepoint)
}
