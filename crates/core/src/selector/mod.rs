//! Selector engine.
//!
//! Supports the jQuery-flavoured subset the scenarios are written in:
//! tag, `*`, `.class`, `#id`, attribute tests (`=`, `*=`, `^=`, `$=`, `~=`),
//! `:contains(text)`, the positional `:first`, `:last`, `:eq(n)`,
//! `:visible`/`:hidden`, descendant and child combinators, and
//! comma-separated groups.
//!
//! Evaluation is left to right over node sets, so positional pseudo-classes
//! apply to everything matched so far (`#vitals tr:last td` means "cells of
//! the last row"), not to sibling position as in CSS.

mod locator;

pub use locator::{IntoLocator, Locator};

use std::collections::BTreeSet;

use crate::dom::{Document, NodeId};
use crate::error::{HarnessError, HarnessResult};

/// A comma-separated list of selectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    pub groups: Vec<Selector>,
}

/// One complex selector: compounds joined by combinators.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// How this compound relates to the previous step (the first step is
    /// always a descendant of the document root).
    pub combinator: Combinator,
    pub compound: Compound,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub parts: Vec<SelectorPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectorPart {
    Tag(String),
    Universal,
    Class(String),
    Id(String),
    Attribute {
        name: String,
        op: AttrOp,
        value: String,
    },
    /// Substring of the element's whitespace-collapsed text.
    Contains(String),
    Visible,
    Hidden,
    Position(Position),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrOp {
    Exists,
    Equals,
    Contains,
    Prefix,
    Suffix,
    Word,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    First,
    Last,
    Eq(usize),
}

impl SelectorList {
    pub fn parse(input: &str) -> HarnessResult<Self> {
        Parser::new(input).parse_list()
    }
}

impl Compound {
    /// Narrow `candidates` (in document order) by this compound's parts, in
    /// the order they were written. Filters keep the elements they match;
    /// a positional picks from whatever survived the parts before it, so
    /// `li:last:contains(a)` is "the last `li`, if it contains `a`".
    fn select(&self, doc: &Document, candidates: Vec<NodeId>) -> Vec<NodeId> {
        let mut set = candidates;
        for part in &self.parts {
            if set.is_empty() {
                break;
            }
            set = match part {
                SelectorPart::Position(position) => apply_position(set, *position),
                _ => set
                    .into_iter()
                    .filter(|id| part_matches(doc, part, *id))
                    .collect(),
            };
        }
        set
    }
}

fn part_matches(doc: &Document, part: &SelectorPart, id: NodeId) -> bool {
    let node = doc.node(id);
    match part {
        SelectorPart::Tag(t) => node.tag == *t,
        SelectorPart::Universal => true,
        SelectorPart::Class(c) => node.has_class(c),
        SelectorPart::Id(i) => node.get_attr("id") == Some(i.as_str()),
        SelectorPart::Attribute { name, op, value } => match node.get_attr(name) {
            None => false,
            Some(actual) => match op {
                AttrOp::Exists => true,
                AttrOp::Equals => actual == value,
                AttrOp::Contains => actual.contains(value.as_str()),
                AttrOp::Prefix => actual.starts_with(value.as_str()),
                AttrOp::Suffix => actual.ends_with(value.as_str()),
                AttrOp::Word => actual.split_whitespace().any(|w| w == value),
            },
        },
        SelectorPart::Contains(text) => doc.text_content(id).contains(text.as_str()),
        SelectorPart::Visible => doc.is_visible(id),
        SelectorPart::Hidden => !doc.is_visible(id),
        SelectorPart::Position(_) => true,
    }
}

/// Resolve a selector list against a document. Results are in document
/// order with duplicates removed, so the same list against the same
/// document always yields the same nodes.
pub fn query(doc: &Document, list: &SelectorList) -> Vec<NodeId> {
    let mut all = BTreeSet::new();
    for selector in &list.groups {
        all.extend(query_selector(doc, selector));
    }
    all.into_iter().collect()
}

fn query_selector(doc: &Document, selector: &Selector) -> Vec<NodeId> {
    let mut context = vec![doc.root()];

    for step in &selector.steps {
        let mut candidates = BTreeSet::new();
        let mut covered: Option<NodeId> = None;
        for ctx in &context {
            match step.combinator {
                Combinator::Descendant => {
                    // Contexts are sorted; a context nested in the previous
                    // one contributes nothing new.
                    if let Some(outer) = covered {
                        if doc.is_descendant_of(*ctx, outer) {
                            continue;
                        }
                    }
                    covered = Some(*ctx);
                    candidates.extend(doc.descendants(*ctx));
                }
                Combinator::Child => candidates.extend(doc.element_children(*ctx)),
            }
        }

        let matched = step.compound.select(doc, candidates.into_iter().collect());

        if matched.is_empty() {
            return matched;
        }
        context = matched;
    }

    context
}

fn apply_position(set: Vec<NodeId>, position: Position) -> Vec<NodeId> {
    let picked = match position {
        Position::First => set.first().copied(),
        Position::Last => set.last().copied(),
        Position::Eq(n) => set.get(n).copied(),
    };
    picked.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> HarnessError {
        HarnessError::InvalidSelector {
            selector: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn expect(&mut self, wanted: char) -> HarnessResult<()> {
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", wanted, c))),
            None => Err(self.error(format!("expected '{}', found end of input", wanted))),
        }
    }

    /// Returns true when at least one whitespace char was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn read_ident(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        name
    }

    fn require_ident(&mut self, what: &str) -> HarnessResult<String> {
        let ident = self.read_ident();
        if ident.is_empty() {
            return Err(self.error(format!("expected {} name", what)));
        }
        Ok(ident)
    }

    fn parse_list(&mut self) -> HarnessResult<SelectorList> {
        let mut groups = Vec::new();
        loop {
            self.skip_whitespace();
            groups.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(',') => {
                    self.pos += 1;
                }
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(SelectorList { groups })
    }

    fn parse_complex(&mut self) -> HarnessResult<Selector> {
        let mut steps = Vec::new();
        let mut combinator = Combinator::Descendant;

        loop {
            let compound = self.parse_compound()?;
            steps.push(Step {
                combinator,
                compound,
            });

            let had_space = self.skip_whitespace();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    combinator = Combinator::Child;
                }
                Some('+') | Some('~') => {
                    return Err(self.error("sibling combinators are not supported"))
                }
                Some(_) if had_space => combinator = Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }

        Ok(Selector { steps })
    }

    fn parse_compound(&mut self) -> HarnessResult<Compound> {
        let mut parts = Vec::new();

        match self.peek() {
            Some('*') => {
                self.pos += 1;
                parts.push(SelectorPart::Universal);
            }
            Some(c) if c.is_alphanumeric() => {
                parts.push(SelectorPart::Tag(self.read_ident().to_lowercase()));
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    parts.push(SelectorPart::Class(self.require_ident("class")?));
                }
                Some('#') => {
                    self.pos += 1;
                    parts.push(SelectorPart::Id(self.require_ident("id")?));
                }
                Some('[') => {
                    self.pos += 1;
                    parts.push(self.parse_attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    parts.push(self.parse_pseudo()?);
                }
                _ => break,
            }
        }

        if parts.is_empty() {
            return Err(match self.peek() {
                Some(c) => self.error(format!("unexpected '{}'", c)),
                None => self.error("expected a selector"),
            });
        }
        Ok(Compound { parts })
    }

    fn parse_attribute(&mut self) -> HarnessResult<SelectorPart> {
        self.skip_whitespace();
        let name = self.require_ident("attribute")?;
        self.skip_whitespace();

        let op = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(SelectorPart::Attribute {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                });
            }
            Some('=') => AttrOp::Equals,
            Some('*') => AttrOp::Contains,
            Some('^') => AttrOp::Prefix,
            Some('$') => AttrOp::Suffix,
            Some('~') => AttrOp::Word,
            Some(c) => return Err(self.error(format!("unexpected '{}' in attribute", c))),
            None => return Err(self.error("unterminated attribute selector")),
        };
        self.pos += 1;
        if op != AttrOp::Equals {
            self.expect('=')?;
        }
        self.skip_whitespace();

        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut val = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some(c) => val.push(c),
                        None => return Err(self.error("unterminated attribute value")),
                    }
                }
                val
            }
            _ => {
                let mut val = String::new();
                while let Some(c) = self.peek() {
                    if c == ']' {
                        break;
                    }
                    val.push(c);
                    self.pos += 1;
                }
                val.trim().to_string()
            }
        };

        self.skip_whitespace();
        self.expect(']')?;
        Ok(SelectorPart::Attribute { name, op, value })
    }

    fn parse_pseudo(&mut self) -> HarnessResult<SelectorPart> {
        let name = self.require_ident("pseudo-class")?.to_lowercase();
        match name.as_str() {
            "contains" => {
                let arg = self.read_argument()?;
                let needle = arg.split_whitespace().collect::<Vec<_>>().join(" ");
                Ok(SelectorPart::Contains(needle))
            }
            "eq" => {
                let arg = self.read_argument()?;
                let n = arg
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| self.error(format!(":eq expects an index, got {:?}", arg)))?;
                Ok(SelectorPart::Position(Position::Eq(n)))
            }
            "first" => Ok(SelectorPart::Position(Position::First)),
            "last" => Ok(SelectorPart::Position(Position::Last)),
            "visible" => Ok(SelectorPart::Visible),
            "hidden" => Ok(SelectorPart::Hidden),
            other => Err(self.error(format!("unsupported pseudo-class :{}", other))),
        }
    }

    /// Read a parenthesised argument. Quotes are stripped; unquoted text may
    /// contain spaces, commas and balanced parentheses.
    fn read_argument(&mut self) -> HarnessResult<String> {
        self.expect('(')?;
        self.skip_whitespace();

        if let Some(quote @ ('"' | '\'')) = self.peek() {
            self.pos += 1;
            let mut arg = String::new();
            loop {
                match self.bump() {
                    Some(c) if c == quote => break,
                    Some(c) => arg.push(c),
                    None => return Err(self.error("unterminated quoted argument")),
                }
            }
            self.skip_whitespace();
            self.expect(')')?;
            return Ok(arg);
        }

        let mut arg = String::new();
        let mut depth = 1;
        loop {
            match self.bump() {
                Some('(') => {
                    depth += 1;
                    arg.push('(');
                }
                Some(')') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    arg.push(')');
                }
                Some(c) => arg.push(c),
                None => return Err(self.error("unterminated argument")),
            }
        }
        Ok(arg.trim().to_string())
    }
}
