//! Person name extraction (candidate, father, mother).
//!
//! The form prints the three labels together and the three names right
//! below them in the same order. When that block cannot be found, each
//! name is looked up after its own label.

use regex::Regex;
use tracing::debug;

use super::patterns::{
    MAE_LABEL, NAME_LABEL_LINE, NAME_LABELS_BLOCK, NOME_LABEL, NOME_PARENT_SUFFIX, PAI_LABEL,
};
use super::validators::{is_name_charset, length_between, looks_like_date};
use super::{Candidate, FieldExtractor};
use crate::form::DocumentText;
use crate::form::fixtures::{is_non_name_token, normalize_spaces};
use crate::models::record::{ExtractedRecord, Field};

const NAME_FIELDS: [Field; 3] = [Field::Nome, Field::NomePai, Field::NomeMae];

/// Non-empty lines inspected after the labels block.
const BLOCK_LINES: usize = 12;

/// Lines inspected below a single label.
const LABEL_LINES: usize = 3;

/// Names extractor.
pub struct NamesExtractor;

impl NamesExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Names read from the line block under the grouped labels.
    fn from_block(
        &self,
        doc: &DocumentText<'_>,
        prior: &ExtractedRecord,
        claimed: &mut Vec<String>,
    ) -> Vec<Candidate> {
        let Some(block) = NAME_LABELS_BLOCK.find(doc.as_str()) else {
            return Vec::new();
        };
        // The match may run into the first name line's indentation.
        let labels_end = block.start() + block.as_str().trim_end().len();

        let mut slots = NAME_FIELDS.iter().filter(|f| !prior.contains(**f));
        let assigned_before: Vec<String> = claimed.clone();
        let mut first_name = true;
        let mut found = Vec::new();

        for line in doc
            .lines_from(labels_end)
            .filter(|l| !l.text.trim().is_empty())
            .take(BLOCK_LINES)
        {
            let value = normalize_spaces(line.text);
            if NAME_LABEL_LINE.is_match(&value) || is_non_name_token(&value) {
                continue;
            }
            if !is_plausible_name(&value) {
                continue;
            }
            // Only the leading line is checked against earlier fields.
            if std::mem::take(&mut first_name) && assigned_before.contains(&value) {
                debug!("names-block: {:?} already assigned", value);
                continue;
            }
            let Some(field) = slots.next() else {
                break;
            };
            claimed.push(value.clone());
            found.push(
                Candidate::new(*field, value, "names-block", 0)
                    .with_span(line.start, line.end),
            );
        }

        found
    }

    /// Name after one label: rest of the label line, else the lines below.
    fn from_label(
        &self,
        doc: &DocumentText<'_>,
        field: Field,
        claimed: &[String],
    ) -> Option<Candidate> {
        let text = doc.as_str();
        let label = label_for(field);
        let anchor = label.find_iter(text).find(|m| {
            field != Field::Nome || !NOME_PARENT_SUFFIX.is_match(&text[m.end()..])
        })?;

        let line = doc.line_at(anchor.end())?;
        let rest = &text[anchor.end()..line.end];
        let same_line = rest.split("  ").next().map(normalize_spaces);
        if let Some(value) = same_line.filter(|v| is_plausible_name(v)) {
            let start = anchor.end() + rest.find(value.as_str()).unwrap_or(0);
            return Some(Candidate::new(field, value, "names-label", 1).with_span(start, line.end));
        }

        doc.lines_from(line.end + 1)
            .filter(|l| !l.text.trim().is_empty())
            .take(LABEL_LINES)
            .take_while(|l| !NAME_LABEL_LINE.is_match(l.text))
            .map(|l| (l, normalize_spaces(l.text)))
            .find(|(_, v)| !claimed.contains(v) && !is_non_name_token(v) && is_plausible_name(v))
            .map(|(l, v)| {
                Candidate::new(field, v, "names-label-below", 2).with_span(l.start, l.end)
            })
    }
}

impl Default for NamesExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for NamesExtractor {
    fn family(&self) -> &'static str {
        "names"
    }

    fn extract(&self, doc: &DocumentText<'_>, prior: &ExtractedRecord) -> Vec<Candidate> {
        let mut claimed: Vec<String> = prior.values_of(&NAME_FIELDS).map(str::to_string).collect();
        let mut found = self.from_block(doc, prior, &mut claimed);

        for field in NAME_FIELDS {
            if prior.contains(field) || found.iter().any(|c| c.field == field) {
                continue;
            }
            if let Some(candidate) = self.from_label(doc, field, &claimed) {
                debug!("{}: block miss, label fallback {:?}", field, candidate.value);
                claimed.push(candidate.value.clone());
                found.push(candidate);
            }
        }

        found
    }
}

fn label_for(field: Field) -> &'static Regex {
    match field {
        Field::NomePai => &PAI_LABEL,
        Field::NomeMae => &MAE_LABEL,
        _ => &NOME_LABEL,
    }
}

/// Uppercase line of plausible length that is not a date.
pub fn is_plausible_name(value: &str) -> bool {
    length_between(value, 3, 100) && is_name_charset(value) && !looks_like_date(value)
}
