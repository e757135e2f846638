//! Rule-based field extractors for RENACH forms.
//!
//! Every field family is an ordered list of [`Rule`]s: an optional anchor
//! label, a value pattern, and a window size. A rule opens a window after
//! its anchor (or searches the whole text when it has none) and yields the
//! first match its validator accepts. Rules carry an explicit priority;
//! [`RuleSet`] always runs them in priority order.

pub mod address;
pub mod category;
pub mod dates;
pub mod documents;
pub mod exam;
pub mod names;
pub mod patterns;
pub mod phone;
pub mod process;
pub mod resolver;
pub mod validators;

pub use address::AddressExtractor;
pub use category::CategoryExtractor;
pub use dates::DateRules;
pub use documents::{IdentityExtractor, RgExtractor};
pub use exam::ExamExtractor;
pub use names::NamesExtractor;
pub use phone::PhoneExtractor;
pub use process::ProcessExtractor;
pub use resolver::resolve;

use regex::Regex;
use tracing::trace;

use super::DocumentText;
use super::locator::{SearchWindow, locate, window};
use crate::models::record::{ExtractedRecord, Field};

/// Trait for field family extractors.
///
/// `prior` is the record assembled by the families that ran before this
/// one. Implementations read it but only return their own contributions.
pub trait FieldExtractor {
    /// Name used in logs.
    fn family(&self) -> &'static str;

    /// Winning candidates of this family, at most one per field.
    fn extract(&self, doc: &DocumentText<'_>, prior: &ExtractedRecord) -> Vec<Candidate>;
}

/// A provisionally matched value for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub field: Field,
    pub value: String,
    /// Rule that produced the value.
    pub source: &'static str,
    /// Lower is preferred.
    pub priority: u8,
    /// Byte range of the raw match in the document.
    pub span: (usize, usize),
}

impl Candidate {
    pub fn new(field: Field, value: impl Into<String>, source: &'static str, priority: u8) -> Self {
        Self {
            field,
            value: value.into(),
            source,
            priority,
            span: (0, 0),
        }
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = (start, end);
        self
    }
}

/// A raw pattern match inside a rule's window.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    text: &'a str,
    /// Byte offset of the window the match was found in.
    pub window_start: usize,
    pub start: usize,
    pub end: usize,
}

impl<'a> Hit<'a> {
    pub fn new(text: &'a str, window_start: usize, start: usize, end: usize) -> Self {
        Self {
            text,
            window_start,
            start,
            end,
        }
    }

    pub fn value(&self) -> &'a str {
        &self.text[self.start..self.end]
    }

    /// Document text after the match.
    pub fn after(&self) -> &'a str {
        &self.text[self.end..]
    }

    /// Document text between the window start and the match.
    pub fn lead(&self) -> &'a str {
        &self.text[self.window_start..self.start]
    }

    pub fn char_before(&self) -> Option<char> {
        self.text[..self.start].chars().next_back()
    }

    pub fn char_after(&self) -> Option<char> {
        self.after().chars().next()
    }
}

/// One extraction rule.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub anchor: Option<&'static Regex>,
    pub value: &'static Regex,
    /// Window size in bytes after the anchor.
    pub window: usize,
    pub priority: u8,
}

impl Rule {
    pub fn anchored(
        name: &'static str,
        anchor: &'static Regex,
        value: &'static Regex,
        window: usize,
        priority: u8,
    ) -> Self {
        Self {
            name,
            anchor: Some(anchor),
            value,
            window,
            priority,
        }
    }

    /// A rule searching the whole document.
    pub fn unanchored(name: &'static str, value: &'static Regex, priority: u8) -> Self {
        Self {
            name,
            anchor: None,
            value,
            window: usize::MAX,
            priority,
        }
    }

    /// The window this rule searches, or `None` when its anchor is missing.
    pub fn open<'a>(&self, text: &'a str) -> Option<SearchWindow<'a>> {
        match self.anchor {
            Some(anchor) => {
                let found = locate(text, anchor)?;
                Some(window(text, found.end, self.window))
            }
            None => Some(SearchWindow::whole(text)),
        }
    }

    /// Apply the rule, returning the first match `validate` turns into a value.
    pub fn apply<'d, F>(&self, doc: &DocumentText<'d>, mut validate: F) -> Option<(String, Hit<'d>)>
    where
        F: FnMut(&Hit<'_>) -> Option<String>,
    {
        let text = doc.as_str();
        let Some(win) = self.open(text) else {
            trace!("rule {}: anchor not found", self.name);
            return None;
        };

        for caps in self.value.captures_iter(win.text) {
            let Some(m) = caps.get(1).or_else(|| caps.get(0)) else {
                continue;
            };
            let hit = Hit::new(text, win.start, win.absolute(m.start()), win.absolute(m.end()));
            match validate(&hit) {
                Some(value) => return Some((value, hit)),
                None => trace!("rule {}: rejected {:?}", self.name, hit.value()),
            }
        }
        None
    }
}

/// Rules for one field, kept sorted by priority.
#[derive(Debug, Clone)]
pub struct RuleSet {
    field: Field,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(field: Field, mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|r| r.priority);
        Self { field, rules }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run rules in priority order and stop at the first accepted value.
    pub fn first<F>(&self, doc: &DocumentText<'_>, mut validate: F) -> Option<Candidate>
    where
        F: FnMut(&Rule, &Hit<'_>) -> Option<String>,
    {
        self.rules.iter().find_map(|rule| {
            rule.apply(doc, |hit| validate(rule, hit))
                .map(|(value, hit)| self.candidate(rule, value, &hit))
        })
    }

    /// Run every rule and keep at most one accepted value per rule.
    pub fn collect<F>(&self, doc: &DocumentText<'_>, mut validate: F) -> Vec<Candidate>
    where
        F: FnMut(&Rule, &Hit<'_>) -> Option<String>,
    {
        self.rules
            .iter()
            .filter_map(|rule| {
                rule.apply(doc, |hit| validate(rule, hit))
                    .map(|(value, hit)| self.candidate(rule, value, &hit))
            })
            .collect()
    }

    fn candidate(&self, rule: &Rule, value: String, hit: &Hit<'_>) -> Candidate {
        Candidate::new(self.field, value, rule.name, rule.priority).with_span(hit.start, hit.end)
    }
}
