//! Contact phone extraction.

use lazy_static::lazy_static;

use super::patterns::{PHONE_VALUE, TELEFONE_LABEL};
use super::validators::digits_of;
use super::{Candidate, FieldExtractor, Rule, RuleSet};
use crate::form::DocumentText;
use crate::models::record::{ExtractedRecord, Field};

lazy_static! {
    static ref PHONE_RULES: RuleSet = RuleSet::new(
        Field::Telefone,
        vec![Rule::anchored("telefone", &TELEFONE_LABEL, &PHONE_VALUE, 60, 0)],
    );
}

/// Phone extractor.
pub struct PhoneExtractor;

impl PhoneExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PhoneExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PhoneExtractor {
    fn family(&self) -> &'static str {
        "phone"
    }

    fn extract(&self, doc: &DocumentText<'_>, _prior: &ExtractedRecord) -> Vec<Candidate> {
        PHONE_RULES
            .first(doc, |_, hit| {
                if hit.char_before().is_some_and(|c| c.is_ascii_digit()) {
                    return None;
                }
                format_phone(hit.value())
            })
            .into_iter()
            .collect()
    }
}

/// Format a phone with area code as `(11) 98765-4321` or `(11) 4567-8901`.
pub fn format_phone(raw: &str) -> Option<String> {
    let digits = digits_of(raw);
    match digits.len() {
        10 => Some(format!("({}) {}-{}", &digits[0..2], &digits[2..6], &digits[6..10])),
        11 => Some(format!("({}) {}-{}", &digits[0..2], &digits[2..7], &digits[7..11])),
        _ => None,
    }
}
