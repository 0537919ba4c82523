use super::*;

/// Comma-separated list of complex selectors. Supported syntax: type,
/// `*`, `#id`, `.class`, `[attr]`, `[attr=value]`, `:not(...)`,
/// `:first-child`, `:nth-child(n)`, descendant and `>` combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorList(Vec<Complex>);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    /// Left to right; `combinators[i]` joins `compounds[i]` and
    /// `compounds[i + 1]`.
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
    /// 1-based position among element siblings.
    nth_child: Option<usize>,
    negations: Vec<SelectorList>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Present(String),
    Equals(String, String),
}

impl SelectorList {
    pub(crate) fn parse(selector: &str) -> Result<Self> {
        let mut parser = SelectorParser {
            src: selector,
            rest: selector,
        };
        let list = parser.list()?;
        if !parser.rest.trim().is_empty() {
            return Err(parser.unsupported());
        }
        Ok(list)
    }
}

impl Dom {
    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.query_selector_all_from(self.root, selector)
    }

    /// Matching descendants of `scope` in document order. Combinators may
    /// look above `scope`.
    pub(crate) fn query_selector_all_from(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendant_elements(scope)
            .into_iter()
            .filter(|node| self.matches_list(*node, &list))
            .collect())
    }

    fn matches_list(&self, node: NodeId, list: &SelectorList) -> bool {
        list.0
            .iter()
            .any(|complex| self.matches_complex(node, complex, complex.compounds.len() - 1))
    }

    /// Right-to-left match of `compounds[..=index]` ending at `node`, with
    /// backtracking over descendant combinators.
    fn matches_complex(&self, node: NodeId, complex: &Complex, index: usize) -> bool {
        if !self.matches_compound(node, &complex.compounds[index]) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match complex.combinators[index - 1] {
            Combinator::Child => self
                .parent(node)
                .is_some_and(|parent| self.matches_complex(parent, complex, index - 1)),
            Combinator::Descendant => self
                .ancestors(node)
                .any(|ancestor| self.matches_complex(ancestor, complex, index - 1)),
        }
    }

    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        let Some(element) = self.element(node) else {
            return false;
        };

        let tag_ok = compound
            .tag
            .as_ref()
            .is_none_or(|tag| element.tag.eq_ignore_ascii_case(tag));
        let id_ok = compound
            .id
            .as_ref()
            .is_none_or(|id| element.attr("id") == Some(id.as_str()));
        let attrs_ok = compound.attrs.iter().all(|test| match test {
            AttrTest::Present(name) => element.attr(name).is_some(),
            AttrTest::Equals(name, value) => element.attr(name) == Some(value.as_str()),
        });
        if !(tag_ok
            && id_ok
            && attrs_ok
            && compound.classes.iter().all(|class| element.has_class(class)))
        {
            return false;
        }

        if let Some(expected) = compound.nth_child {
            let position = self.parent(node).and_then(|parent| {
                self.element_children(parent)
                    .iter()
                    .position(|sibling| *sibling == node)
            });
            if position.map(|index| index + 1) != Some(expected) {
                return false;
            }
        }

        !compound
            .negations
            .iter()
            .any(|negated| self.matches_list(node, negated))
    }
}

struct SelectorParser<'a> {
    src: &'a str,
    rest: &'a str,
}

impl<'a> SelectorParser<'a> {
    fn unsupported(&self) -> Error {
        Error::UnsupportedSelector(self.src.to_string())
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.rest = &self.rest[ch.len_utf8()..];
        Some(ch)
    }

    fn eat(&mut self, prefix: &str) -> bool {
        match self.rest.strip_prefix(prefix) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// Skips whitespace and reports whether any was present.
    fn skip_whitespace(&mut self) -> bool {
        let trimmed = self.rest.trim_start();
        let skipped = trimmed.len() != self.rest.len();
        self.rest = trimmed;
        skipped
    }

    fn ident(&mut self) -> Result<&'a str> {
        let len = self
            .rest
            .find(|ch: char| !(ch.is_alphanumeric() || ch == '-' || ch == '_'))
            .unwrap_or(self.rest.len());
        if len == 0 {
            return Err(self.unsupported());
        }
        let (ident, rest) = self.rest.split_at(len);
        self.rest = rest;
        Ok(ident)
    }

    /// Parses up to end of input or an unmatched `)`.
    fn list(&mut self) -> Result<SelectorList> {
        let mut complexes = vec![self.complex()?];
        while self.eat(",") {
            complexes.push(self.complex()?);
        }
        Ok(SelectorList(complexes))
    }

    fn complex(&mut self) -> Result<Complex> {
        self.skip_whitespace();
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();

        loop {
            let spaced = self.skip_whitespace();
            let combinator = if self.eat(">") {
                self.skip_whitespace();
                Combinator::Child
            } else if spaced && !matches!(self.peek(), None | Some(',' | ')')) {
                Combinator::Descendant
            } else {
                break;
            };
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }

        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut any = false;

        if self.eat("*") {
            any = true;
        } else if self.peek().is_some_and(char::is_alphabetic) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
            any = true;
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    let id = self.ident()?.to_string();
                    if compound.id.replace(id).is_some() {
                        return Err(self.unsupported());
                    }
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.ident()?.to_string());
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.attr_test()?);
                }
                Some(':') => {
                    self.bump();
                    self.pseudo_class(&mut compound)?;
                }
                _ => break,
            }
            any = true;
        }

        if any {
            Ok(compound)
        } else {
            Err(self.unsupported())
        }
    }

    fn attr_test(&mut self) -> Result<AttrTest> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        if self.eat("]") {
            return Ok(AttrTest::Present(name));
        }
        if !self.eat("=") {
            return Err(self.unsupported());
        }
        self.skip_whitespace();

        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let end = self.rest.find(quote).ok_or_else(|| self.unsupported())?;
                let value = &self.rest[..end];
                self.rest = &self.rest[end + quote.len_utf8()..];
                value
            }
            _ => self.ident()?,
        };
        self.skip_whitespace();
        if !self.eat("]") {
            return Err(self.unsupported());
        }
        Ok(AttrTest::Equals(name, value.to_string()))
    }

    fn pseudo_class(&mut self, compound: &mut Compound) -> Result<()> {
        let position = match self.ident()? {
            "first-child" => 1,
            "nth-child" => {
                if !self.eat("(") {
                    return Err(self.unsupported());
                }
                let end = self.rest.find(')').ok_or_else(|| self.unsupported())?;
                let index = self.rest[..end]
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|index| *index > 0)
                    .ok_or_else(|| self.unsupported())?;
                self.rest = &self.rest[end + 1..];
                index
            }
            "not" => {
                if !self.eat("(") {
                    return Err(self.unsupported());
                }
                let negated = self.list()?;
                self.skip_whitespace();
                if !self.eat(")") {
                    return Err(self.unsupported());
                }
                compound.negations.push(negated);
                return Ok(());
            }
            _ => return Err(self.unsupported()),
        };
        if compound.nth_child.replace(position).is_some() {
            return Err(self.unsupported());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dom(html: &str) -> Dom {
        html::parse_html(html).unwrap_or_else(|err| panic!("parse failed: {err}"))
    }

    #[test]
    fn descendant_combinator_backtracks_past_nearer_ancestors() -> Result<()> {
        let dom = dom(
            r#"<div class="a"><div class="b"><div class="a"><p id="t">x</p></div></div></div>"#,
        );
        assert_eq!(dom.query_selector_all(".a > .b p")?.len(), 1);
        assert_eq!(dom.query_selector_all(".b > .a > p#t")?.len(), 1);
        assert_eq!(dom.query_selector_all(".b > p")?.len(), 0);
        Ok(())
    }

    #[test]
    fn attribute_values_may_contain_combinator_characters() -> Result<()> {
        let dom = dom(r#"<span data-x="a > b, c">1</span><span data-x=plain>2</span>"#);
        assert_eq!(dom.query_selector_all(r#"span[data-x="a > b, c"]"#)?.len(), 1);
        assert_eq!(dom.query_selector_all("[data-x=plain], [missing]")?.len(), 1);
        Ok(())
    }

    #[test]
    fn not_accepts_a_selector_list() -> Result<()> {
        let dom = dom(r#"<ul><li class="a">1</li><li class="b">2</li><li>3</li></ul>"#);
        assert_eq!(dom.query_selector_all("li:not(.a, .b)")?.len(), 1);
        assert_eq!(dom.query_selector_all("ul > li:nth-child(3)")?.len(), 1);
        assert_eq!(dom.query_selector_all("li:first-child.a")?.len(), 1);
        Ok(())
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        for selector in ["", "a,", "> p", "p >", "p:hover", "[x", ".", "p:nth-child(0)", "#a#b"] {
            assert!(
                matches!(SelectorList::parse(selector), Err(Error::UnsupportedSelector(_))),
                "{selector:?} should be rejected"
            );
        }
    }
}
