use std::fmt;
use std::str::FromStr;

use super::{Combinator, Compound, Selector, SelectorList, SelectorPart, AttrOp, Step};
use crate::error::{HarnessError, HarnessResult};

/// A selector together with how strictly it must resolve.
///
/// By default a locator is strict: resolving it for an action or a text
/// assertion fails unless exactly one element matches. `.first()` opts out
/// and takes the first match in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Locator {
    source: String,
    list: SelectorList,
    first: bool,
}

impl Locator {
    pub fn css(selector: &str) -> HarnessResult<Self> {
        Ok(Self {
            source: selector.trim().to_string(),
            list: SelectorList::parse(selector)?,
            first: false,
        })
    }

    /// `[data-test-selector="name"]`, the stable hook the application
    /// exposes for tests.
    pub fn test_selector(name: &str) -> Self {
        let compound = Compound {
            parts: vec![SelectorPart::Attribute {
                name: "data-test-selector".to_string(),
                op: AttrOp::Equals,
                value: name.to_string(),
            }],
        };
        Self {
            source: format!("[data-test-selector={}]", name),
            list: SelectorList {
                groups: vec![Selector {
                    steps: vec![Step {
                        combinator: Combinator::Descendant,
                        compound,
                    }],
                }],
            },
            first: false,
        }
    }

    /// Narrow every group to elements whose text contains `text`.
    pub fn containing(mut self, text: &str) -> Self {
        let needle = text.split_whitespace().collect::<Vec<_>>().join(" ");
        for group in &mut self.list.groups {
            if let Some(last) = group.steps.last_mut() {
                last.compound.parts.push(SelectorPart::Contains(needle.clone()));
            }
        }
        self.source = format!("{}:contains({})", self.source, text);
        self
    }

    /// Only match inside elements matched by `scope`.
    pub fn within(self, scope: &Locator) -> Self {
        let mut groups = Vec::new();
        for outer in &scope.list.groups {
            for inner in &self.list.groups {
                let mut steps = outer.steps.clone();
                let mut tail = inner.steps.clone();
                if let Some(head) = tail.first_mut() {
                    head.combinator = Combinator::Descendant;
                }
                steps.extend(tail);
                groups.push(Selector { steps });
            }
        }
        Self {
            source: format!("{} {}", scope.source, self.source),
            list: SelectorList { groups },
            first: self.first,
        }
    }

    pub fn first(mut self) -> Self {
        self.first = true;
        self
    }

    pub fn is_first(&self) -> bool {
        self.first
    }

    pub fn selectors(&self) -> &SelectorList {
        &self.list
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Locator {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locator::css(s)
    }
}

/// Anything a step can accept as an element target: selector strings are
/// parsed on the spot, prebuilt locators pass through.
pub trait IntoLocator {
    fn into_locator(self) -> HarnessResult<Locator>;
}

impl IntoLocator for &str {
    fn into_locator(self) -> HarnessResult<Locator> {
        Locator::css(self)
    }
}

impl IntoLocator for String {
    fn into_locator(self) -> HarnessResult<Locator> {
        Locator::css(&self)
    }
}

impl IntoLocator for &String {
    fn into_locator(self) -> HarnessResult<Locator> {
        Locator::css(self)
    }
}

impl IntoLocator for Locator {
    fn into_locator(self) -> HarnessResult<Locator> {
        Ok(self)
    }
}

impl IntoLocator for &Locator {
    fn into_locator(self) -> HarnessResult<Locator> {
        Ok(self.clone())
    }
}
