//! Address fragment extraction.
//!
//! Streets are matched against the installation's known street list before
//! any generic `Rua`/`Av.` pattern. The house number is only looked for
//! between the street and the next `Complemento`/`Bairro`/`CEP` marker so
//! postal and municipality codes can never be read as a number.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use super::patterns::{
    ADDRESS_END_MARKER, ANY_FIELD_LABEL, BAIRRO_LABEL, CEP_FORMATTED, CEP_LABEL, CEP_VALUE,
    CODIGO_MUNICIPIO_LABEL, COMPLEMENTO_LABEL, HOUSE_NUMBER, LOGRADOURO_LABEL,
    MUNICIPIO_CODE_VALUE, MUNICIPIO_LABEL, MUNICIPIO_NAME_VALUE, MUNICIPIO_WITH_CODE,
    NUMERO_LABEL, NUMERO_LABELED, STREET_PREFIXED, STREET_PREFIXED_UPPER, STREET_TRAILING_NUMBER,
};
use super::validators::{
    format_cep, is_digits, is_standalone_number, length_between, looks_like_date,
};
use super::{Candidate, FieldExtractor, Hit, Rule, RuleSet};
use crate::form::DocumentText;
use crate::form::fixtures::{KNOWN_STREETS, canonical_municipality, normalize_spaces};
use crate::form::locator::{locate_folded_word, window};
use crate::models::record::{ExtractedRecord, Field};

/// Largest span searched for a house number after the street.
const NUMBER_REGION: usize = 200;

lazy_static! {
    static ref STREET_RULES: RuleSet = RuleSet::new(
        Field::Logradouro,
        vec![
            Rule::anchored("logradouro-label", &LOGRADOURO_LABEL, &STREET_PREFIXED, 150, 1),
            Rule::unanchored("street-prefix", &STREET_PREFIXED_UPPER, 2),
        ],
    );

    static ref CEP_RULES: RuleSet = RuleSet::new(
        Field::Cep,
        vec![
            Rule::anchored("cep-label", &CEP_LABEL, &CEP_VALUE, 40, 0),
            Rule::unanchored("cep-formatted", &CEP_FORMATTED, 1),
        ],
    );

    static ref MUNICIPIO_CODE_RULES: RuleSet = RuleSet::new(
        Field::CodigoMunicipio,
        vec![Rule::anchored(
            "codigo-municipio-label",
            &CODIGO_MUNICIPIO_LABEL,
            &MUNICIPIO_CODE_VALUE,
            30,
            1,
        )],
    );

    static ref MUNICIPIO_NAME_RULES: RuleSet = RuleSet::new(
        Field::Municipio,
        vec![Rule::anchored("municipio-label", &MUNICIPIO_LABEL, &MUNICIPIO_NAME_VALUE, 60, 1)],
    );
}

/// Address extractor.
pub struct AddressExtractor;

impl AddressExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Street, with the span trimmed to the street name itself.
    pub fn street(&self, doc: &DocumentText<'_>) -> Option<Candidate> {
        known_street(doc).or_else(|| {
            let mut cleaned_len = 0;
            let found = STREET_RULES.first(doc, |_, hit| {
                let street = strip_trailing_number(hit.value());
                cleaned_len = street.len();
                length_between(street, 5, 100).then(|| normalize_spaces(street))
            })?;
            let start = found.span.0;
            Some(found.with_span(start, start + cleaned_len))
        })
    }

    /// House number between the street (or `Número` label) and the next marker.
    pub fn number(&self, doc: &DocumentText<'_>, street: Option<&Candidate>) -> Option<Candidate> {
        let text = doc.as_str();
        let start = match street {
            Some(street) => street.span.1,
            None => NUMERO_LABEL.find(text)?.start(),
        };
        let region = window(text, start, NUMBER_REGION);
        let end = ADDRESS_END_MARKER
            .find(region.text)
            .map_or(region.len(), |m| m.start());
        let region = window(text, region.start, end);

        let labeled = first_in(text, region.start, region.text, &NUMERO_LABELED, |hit| {
            house_number(hit.value())
        })
        .map(|(value, hit)| (value, hit, "numero-label", 0));

        labeled
            .or_else(|| {
                first_in(text, region.start, region.text, &HOUSE_NUMBER, |hit| {
                    if !is_standalone_number(hit) || looks_like_date(line_around(text, hit)) {
                        return None;
                    }
                    house_number(hit.value())
                })
                .map(|(value, hit)| (value, hit, "numero-after-street", 1))
            })
            .map(|(value, hit, source, priority)| {
                Candidate::new(Field::Numero, value, source, priority).with_span(hit.start, hit.end)
            })
    }

    pub fn cep(&self, doc: &DocumentText<'_>) -> Option<Candidate> {
        CEP_RULES.first(doc, |_, hit| {
            if hit.char_before().is_some_and(|c| c.is_ascii_digit()) {
                return None;
            }
            format_cep(hit.value())
        })
    }

    /// Municipality code and name.
    ///
    /// A 5-digit code directly before a known municipality name gives both;
    /// otherwise each is read after its own label.
    pub fn municipality(&self, doc: &DocumentText<'_>) -> Vec<Candidate> {
        if let Some(caps) = MUNICIPIO_WITH_CODE.captures(doc.as_str()) {
            if let (Some(code), Some(name)) = (caps.get(1), caps.get(2)) {
                let canonical = canonical_municipality(name.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| normalize_spaces(name.as_str()).to_uppercase());
                return vec![
                    Candidate::new(
                        Field::CodigoMunicipio,
                        code.as_str(),
                        "codigo-antes-municipio",
                        0,
                    )
                    .with_span(code.start(), code.end()),
                    Candidate::new(Field::Municipio, canonical, "codigo-antes-municipio", 0)
                        .with_span(name.start(), name.end()),
                ];
            }
        }

        let code = MUNICIPIO_CODE_RULES.first(doc, |_, hit| Some(hit.value().to_string()));
        let name = MUNICIPIO_NAME_RULES.first(doc, |_, hit| {
            let value = normalize_spaces(hit.value());
            if ANY_FIELD_LABEL.is_match(&value) || !length_between(&value, 3, 50) {
                return None;
            }
            Some(
                canonical_municipality(&value)
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_uppercase()),
            )
        });
        code.into_iter().chain(name).collect()
    }
}

impl Default for AddressExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AddressExtractor {
    fn family(&self) -> &'static str {
        "address"
    }

    fn extract(&self, doc: &DocumentText<'_>, _prior: &ExtractedRecord) -> Vec<Candidate> {
        let street = self.street(doc);
        let number = self.number(doc, street.as_ref());

        let mut found: Vec<Candidate> = street.into_iter().chain(number).collect();
        found.extend(labeled_line_value(
            doc,
            Field::Complemento,
            &COMPLEMENTO_LABEL,
            "complemento-label",
        ));
        found.extend(labeled_line_value(
            doc,
            Field::Bairro,
            &BAIRRO_LABEL,
            "bairro-label",
        ));
        found.extend(self.cep(doc));
        found.extend(self.municipality(doc));
        found
    }
}

/// Earliest known street in the document, in its canonical spelling.
fn known_street(doc: &DocumentText<'_>) -> Option<Candidate> {
    KNOWN_STREETS
        .iter()
        .filter_map(|street| locate_folded_word(doc.as_str(), street).map(|a| (a, *street)))
        .min_by_key(|(anchor, _)| anchor.start)
        .map(|(anchor, street)| {
            Candidate::new(Field::Logradouro, street, "known-street", 0)
                .with_span(anchor.start, anchor.end)
        })
}

/// Street text with a trailing house number and separators removed.
fn strip_trailing_number(street: &str) -> &str {
    let street = match STREET_TRAILING_NUMBER.find(street) {
        Some(m) => &street[..m.start()],
        None => street,
    };
    street.trim_end().trim_end_matches([',', '-']).trim_end()
}

/// `S/N` or a number from 1 to 99999.
fn house_number(value: &str) -> Option<String> {
    let upper = value.to_uppercase();
    if upper == "S/N" || upper == "SN" {
        return Some("S/N".to_string());
    }
    if !is_digits(value) {
        return None;
    }
    let n: u32 = value.parse().ok()?;
    (1..100_000).contains(&n).then(|| n.to_string())
}

fn line_around<'a>(text: &'a str, hit: &Hit<'_>) -> &'a str {
    let start = text[..hit.start].rfind('\n').map_or(0, |i| i + 1);
    let end = text[hit.end..].find('\n').map_or(text.len(), |i| hit.end + i);
    &text[start..end]
}

/// First match of `pattern` inside a region that `validate` accepts.
fn first_in<'a, F>(
    text: &'a str,
    offset: usize,
    region: &str,
    pattern: &Regex,
    mut validate: F,
) -> Option<(String, Hit<'a>)>
where
    F: FnMut(&Hit<'a>) -> Option<String>,
{
    pattern.captures_iter(region).find_map(|caps| {
        let m = caps.get(1).or_else(|| caps.get(0))?;
        let hit = Hit::new(text, offset, offset + m.start(), offset + m.end());
        let value = validate(&hit);
        if value.is_none() {
            trace!("numero: rejected {:?}", hit.value());
        }
        value.map(|v| (v, hit))
    })
}

/// Value after a label on the same line, else on the next non-label line.
fn labeled_line_value(
    doc: &DocumentText<'_>,
    field: Field,
    label: &Regex,
    source: &'static str,
) -> Option<Candidate> {
    let text = doc.as_str();
    let anchor = label.find(text)?;
    let line = doc.line_at(anchor.end())?;

    let rest = text.get(anchor.end()..line.end).unwrap_or("");
    let rest = rest.split("  ").next().unwrap_or("");
    let rest = match ADDRESS_END_MARKER.find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    };
    let value = normalize_spaces(rest);
    if !value.is_empty() && !ANY_FIELD_LABEL.is_match(&value) {
        return length_between(&value, 1, 60).then(|| {
            Candidate::new(field, value, source, 0).with_span(anchor.end(), line.end)
        });
    }

    let next = doc
        .lines_from(line.end + 1)
        .find(|l| !l.text.trim().is_empty())?;
    let value = normalize_spaces(next.text);
    (!ANY_FIELD_LABEL.is_match(&value) && length_between(&value, 1, 60))
        .then(|| Candidate::new(field, value, source, 1).with_span(next.start, next.end))
}
