//! Query grammar used by the page watchers.
//!
//! Supported: type (`div`), universal (`*`), `#id`, `.class`, `[attr]`,
//! `[attr=value]` with optional quotes, descendant (whitespace) and child
//! (`>`) combinators, and comma-separated lists. Pseudo-classes and the
//! sibling combinators are rejected.

// input: "body #chat-container, meta[name=\"user-data\"]"
// output: SelectorList(vec![ComplexSelector { .. }, ComplexSelector { .. }])
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<CompoundSelector>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    pub combinators: Vec<Combinator>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    /// Lowercase tag; `None` for `*` or an omitted tag.
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CssError {
    #[error("selector {selector:?} ends unexpectedly")]
    UnexpectedEnd { selector: String },
    #[error("unexpected {found:?} at offset {offset} in selector {selector:?}")]
    Unexpected {
        selector: String,
        found: char,
        offset: usize,
    },
    #[error("unterminated string in selector {selector:?}")]
    UnterminatedString { selector: String },
}

pub fn parse_selector_list(input: &str) -> Result<SelectorList, CssError> {
    let mut parser = Parser { input, pos: 0 };
    let mut selectors = Vec::new();
    loop {
        selectors.push(parser.complex()?);
        parser.skip_ws();
        match parser.peek() {
            None => break,
            Some(b',') => parser.pos += 1,
            Some(_) => return Err(parser.unexpected()),
        }
    }
    Ok(SelectorList(selectors))
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skip whitespace; returns whether any was skipped.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn unexpected(&self) -> CssError {
        match self.input[self.pos..].chars().next() {
            Some(found) => CssError::Unexpected {
                selector: self.input.to_string(),
                found,
                offset: self.pos,
            },
            None => CssError::UnexpectedEnd {
                selector: self.input.to_string(),
            },
        }
    }

    fn complex(&mut self) -> Result<ComplexSelector, CssError> {
        self.skip_ws();
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(b',') => break,
                Some(b'>') => {
                    self.pos += 1;
                    self.skip_ws();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_ws => combinators.push(Combinator::Descendant),
                Some(_) => return Err(self.unexpected()),
            }
            compounds.push(self.compound()?);
        }
        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<CompoundSelector, CssError> {
        let start = self.pos;
        let mut compound = CompoundSelector::default();
        if !self.eat(b'*') {
            compound.tag = self.ident().map(|name| name.to_ascii_lowercase());
        }
        loop {
            match self.peek() {
                Some(b'#') => {
                    self.pos += 1;
                    compound.id = Some(self.expect_ident()?.to_string());
                }
                Some(b'.') => {
                    self.pos += 1;
                    compound.classes.push(self.expect_ident()?.to_string());
                }
                Some(b'[') => {
                    self.pos += 1;
                    compound.attributes.push(self.attribute()?);
                }
                _ => break,
            }
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Option<&str> {
        let start = self.pos;
        // Bytes >= 0x80 belong to non-ASCII characters, which are valid in identifiers.
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80)
        {
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.input[start..self.pos])
    }

    fn expect_ident(&mut self) -> Result<&str, CssError> {
        let start = self.pos;
        if self.ident().is_none() {
            return Err(self.unexpected());
        }
        Ok(&self.input[start..self.pos])
    }

    fn attribute(&mut self) -> Result<AttributeSelector, CssError> {
        self.skip_ws();
        let name = self.expect_ident()?.to_ascii_lowercase();
        self.skip_ws();
        let value = if self.eat(b'=') {
            self.skip_ws();
            let value = match self.peek() {
                Some(quote @ (b'"' | b'\'')) => {
                    self.pos += 1;
                    let rest = &self.input[self.pos..];
                    let end = rest.find(quote as char).ok_or_else(|| {
                        CssError::UnterminatedString {
                            selector: self.input.to_string(),
                        }
                    })?;
                    let value = rest[..end].to_string();
                    self.pos += end + 1;
                    value
                }
                _ => self.expect_ident()?.to_string(),
            };
            self.skip_ws();
            Some(value)
        } else {
            None
        };
        if !self.eat(b']') {
            return Err(self.unexpected());
        }
        Ok(AttributeSelector { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound(tag: Option<&str>, id: Option<&str>, classes: &[&str]) -> CompoundSelector {
        CompoundSelector {
            tag: tag.map(str::to_string),
            id: id.map(str::to_string),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            attributes: Vec::new(),
        }
    }

    #[test]
    fn parses_compound_parts() {
        let list = parse_selector_list("LI.pager-prev.disabled#x").unwrap();
        assert_eq!(
            list.0[0].compounds,
            vec![compound(Some("li"), Some("x"), &["pager-prev", "disabled"])]
        );
    }

    #[test]
    fn parses_combinators_and_lists() {
        let list = parse_selector_list("body  #chat-container, ul > li ,*").unwrap();
        assert_eq!(list.0.len(), 3);
        assert_eq!(list.0[0].combinators, vec![Combinator::Descendant]);
        assert_eq!(list.0[1].combinators, vec![Combinator::Child]);
        assert_eq!(list.0[2].compounds, vec![compound(None, None, &[])]);
    }

    #[test]
    fn parses_attribute_selectors() {
        let list = parse_selector_list(r#"meta[name="user-data"][data-userid]"#).unwrap();
        assert_eq!(
            list.0[0].compounds[0].attributes,
            vec![
                AttributeSelector {
                    name: "name".to_string(),
                    value: Some("user-data".to_string()),
                },
                AttributeSelector {
                    name: "data-userid".to_string(),
                    value: None,
                },
            ]
        );
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert!(matches!(
            parse_selector_list("a + b"),
            Err(CssError::Unexpected { found: '+', .. })
        ));
        assert!(matches!(
            parse_selector_list("a:hover"),
            Err(CssError::Unexpected { found: ':', .. })
        ));
        assert!(matches!(
            parse_selector_list("div,"),
            Err(CssError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_selector_list("a[x='y]"),
            Err(CssError::UnterminatedString { .. })
        ));
        assert!(matches!(
            parse_selector_list(".#"),
            Err(CssError::Unexpected { found: '#', offset: 1, .. })
        ));
    }
}
