//! Exam section extraction: result, report number and accredited number.
//!
//! The report (laudo) number, the accredited professional's number and the
//! exam year all sit next to the word "Laudo". The accredited number is read
//! first and reserved, then the report number is the closest short id to a
//! "Laudo" that is neither the reserved value nor a plausible year.

use chrono::Datelike;
use lazy_static::lazy_static;

use super::dates::DateRules;
use super::patterns::{
    APTO, CREDENCIADO_LABEL, CREDENCIADO_VALUE, DISPENSADO, INAPTO, INAPTO_TEMPORARIO,
    LAUDO_NUMBER_LABEL, LAUDO_NUMBER_LABEL_REVERSED, LAUDO_NUMBER_VALUE, LAUDO_WORD,
    RESULTADO_LABEL, SHORT_ID, TEMPORARIO,
};
use super::validators::{is_standalone_number, not_reserved, outside_range};
use super::{Candidate, FieldExtractor, Hit, Rule, RuleSet};
use crate::form::DocumentText;
use crate::form::locator::{fold, window};
use crate::models::record::{ExtractedRecord, Field};

/// Search radii around "Laudo", tried in order, with their priorities.
const LAUDO_RADII: [(usize, u8); 3] = [(40, 2), (80, 3), (160, 4)];

/// Bytes after a bare "Inapto" checked for "Temporário".
const TEMPORARY_LOOKAHEAD: usize = 40;

const RESULT_WINDOW: usize = 100;

lazy_static! {
    static ref CREDENCIADO_RULES: RuleSet = RuleSet::new(
        Field::NumeroCredenciado,
        vec![Rule::anchored("credenciado-label", &CREDENCIADO_LABEL, &CREDENCIADO_VALUE, 30, 0)],
    );

    static ref LAUDO_RULES: RuleSet = RuleSet::new(
        Field::NumeroLaudoRenach,
        vec![
            Rule::anchored("laudo-label", &LAUDO_NUMBER_LABEL, &LAUDO_NUMBER_VALUE, 30, 0),
            Rule::anchored(
                "laudo-label-reversed",
                &LAUDO_NUMBER_LABEL_REVERSED,
                &LAUDO_NUMBER_VALUE,
                30,
                1,
            ),
        ],
    );

    static ref RESULT_RULES: RuleSet = RuleSet::new(
        Field::ResultadoExame,
        vec![
            Rule::anchored(
                "resultado-inapto-temporario",
                &RESULTADO_LABEL,
                &INAPTO_TEMPORARIO,
                RESULT_WINDOW,
                0,
            ),
            Rule::anchored("resultado-inapto", &RESULTADO_LABEL, &INAPTO, RESULT_WINDOW, 1),
            Rule::anchored("resultado-apto", &RESULTADO_LABEL, &APTO, RESULT_WINDOW, 2),
            Rule::anchored("resultado-dispensado", &RESULTADO_LABEL, &DISPENSADO, RESULT_WINDOW, 3),
            Rule::unanchored("inapto-temporario", &INAPTO_TEMPORARIO, 4),
            Rule::unanchored("inapto", &INAPTO, 5),
            Rule::unanchored("apto", &APTO, 6),
            Rule::unanchored("dispensado", &DISPENSADO, 7),
        ],
    );
}

/// Exam section extractor.
pub struct ExamExtractor {
    dates: DateRules,
}

impl ExamExtractor {
    pub fn new(dates: DateRules) -> Self {
        Self { dates }
    }

    pub fn credenciado(&self, doc: &DocumentText<'_>) -> Option<Candidate> {
        CREDENCIADO_RULES.first(doc, |_, hit| Some(hit.value().to_string()))
    }

    /// Report number, never equal to `reserved` and never a plausible year.
    pub fn laudo(&self, doc: &DocumentText<'_>, reserved: &[&str]) -> Option<Candidate> {
        let year = i64::from(self.dates.reference().year());
        let mut accept = |hit: &Hit<'_>| -> Option<String> {
            let value = hit.value();
            let plausible = not_reserved(value, reserved)
                && (value.len() != 4 || outside_range(value, year - 10, year + 1))
                && is_standalone_number(hit);
            plausible.then(|| value.to_string())
        };

        LAUDO_RULES
            .first(doc, |_, hit| accept(hit))
            .or_else(|| closest_to_laudo(doc, &mut accept))
    }

    pub fn result(&self, doc: &DocumentText<'_>) -> Option<Candidate> {
        RESULT_RULES.first(doc, |_, hit| Some(canonical_result(hit)))
    }
}

impl Default for ExamExtractor {
    fn default() -> Self {
        Self::new(DateRules::default())
    }
}

impl FieldExtractor for ExamExtractor {
    fn family(&self) -> &'static str {
        "exam"
    }

    fn extract(&self, doc: &DocumentText<'_>, prior: &ExtractedRecord) -> Vec<Candidate> {
        let credenciado = self.credenciado(doc);
        let reserved: Vec<&str> = credenciado
            .as_ref()
            .map(|c| c.value.as_str())
            .or(prior.get(Field::NumeroCredenciado))
            .into_iter()
            .collect();
        let laudo = self.laudo(doc, &reserved);

        credenciado
            .into_iter()
            .chain(laudo)
            .chain(self.result(doc))
            .chain(self.dates.exam(doc))
            .collect()
    }
}

/// Closest accepted short id around any "Laudo", widening the radius.
fn closest_to_laudo<F>(doc: &DocumentText<'_>, accept: &mut F) -> Option<Candidate>
where
    F: FnMut(&Hit<'_>) -> Option<String>,
{
    let text = doc.as_str();
    let words: Vec<_> = LAUDO_WORD.find_iter(text).collect();

    for (radius, priority) in LAUDO_RADII {
        let mut best: Option<(usize, String, Hit<'_>)> = None;

        for word in &words {
            let from = word.start().saturating_sub(radius);
            let around = window(text, from, word.end() + radius - from);

            for m in SHORT_ID.captures_iter(around.text).filter_map(|c| c.get(1)) {
                let hit = Hit::new(
                    text,
                    around.start,
                    around.absolute(m.start()),
                    around.absolute(m.end()),
                );
                let distance = if hit.end <= word.start() {
                    word.start() - hit.end
                } else {
                    hit.start.saturating_sub(word.end())
                };
                if best.as_ref().is_some_and(|(d, _, _)| *d <= distance) {
                    continue;
                }
                if let Some(value) = accept(&hit) {
                    best = Some((distance, value, hit));
                }
            }
        }

        if let Some((_, value, hit)) = best {
            return Some(
                Candidate::new(Field::NumeroLaudoRenach, value, "laudo-proximity", priority)
                    .with_span(hit.start, hit.end),
            );
        }
    }
    None
}

/// Canonical result for a matched result word.
///
/// A bare "Inapto" followed closely by "Temporário" is the temporary form.
fn canonical_result(hit: &Hit<'_>) -> String {
    let folded = fold(hit.value());
    let result = if folded.contains("temporario") {
        "Inapto Temporário"
    } else if folded.starts_with("inapto") {
        let after = hit.after();
        let end = after
            .char_indices()
            .map(|(i, _)| i)
            .find(|i| *i >= TEMPORARY_LOOKAHEAD)
            .unwrap_or(after.len());
        if TEMPORARIO.is_match(&after[..end]) {
            "Inapto Temporário"
        } else {
            "Inapto"
        }
    } else if folded.starts_with("dispensad") {
        "Dispensado"
    } else {
        "Apto"
    };
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn extractor() -> ExamExtractor {
        ExamExtractor::new(DateRules::new(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()))
    }

    fn field(found: &[Candidate], field: Field) -> Option<&str> {
        found.iter().find(|c| c.field == field).map(|c| c.value.as_str())
    }

    #[test]
    fn test_laudo_never_takes_credenciado() {
        let doc = DocumentText::new("N° do Credenciado: 1876\nN° do Laudo: 1563\n");
        let found = extractor().extract(&doc, &ExtractedRecord::new());
        assert_eq!(field(&found, Field::NumeroCredenciado), Some("1876"));
        assert_eq!(field(&found, Field::NumeroLaudoRenach), Some("1563"));
    }

    #[test]
    fn test_proximity_skips_reserved_value() {
        let doc = DocumentText::new("Credenciado 1876 Laudo 1563");
        let found = extractor().extract(&doc, &ExtractedRecord::new());
        assert_eq!(field(&found, Field::NumeroLaudoRenach), Some("1563"));
    }

    #[test]
    fn test_year_near_laudo_is_not_an_id() {
        let doc = DocumentText::new("Laudo emitido em 2025");
        assert!(extractor().laudo(&doc, &[]).is_none());
    }

    #[test]
    fn test_date_fragments_are_not_ids() {
        let doc = DocumentText::new("Laudo 10/03/2025");
        assert!(extractor().laudo(&doc, &[]).is_none());
    }

    #[test]
    fn test_closest_id_wins() {
        let doc = DocumentText::new("Exame 4321 ..................... Laudo 555");
        let c = extractor().laudo(&doc, &[]).unwrap();
        assert_eq!(c.value, "555");
        assert_eq!(c.source, "laudo-proximity");
    }

    #[test]
    fn test_inapto_temporario_not_truncated() {
        let doc = DocumentText::new("Resultado: Inapto Temporário");
        assert_eq!(extractor().result(&doc).unwrap().value, "Inapto Temporário");

        let doc = DocumentText::new("RESULTADO: INAPTO TEMPORARIO");
        assert_eq!(extractor().result(&doc).unwrap().value, "Inapto Temporário");
    }

    #[test]
    fn test_bare_inapto_upgraded_by_lookahead() {
        let doc = DocumentText::new("Resultado: INAPTO\n(TEMPORÁRIO)");
        assert_eq!(extractor().result(&doc).unwrap().value, "Inapto Temporário");

        let doc = DocumentText::new("Resultado: Inapto");
        assert_eq!(extractor().result(&doc).unwrap().value, "Inapto");
    }

    #[test]
    fn test_apto_and_dispensado() {
        assert_eq!(
            extractor().result(&DocumentText::new("Resultado: APTO")).unwrap().value,
            "Apto"
        );
        assert_eq!(
            extractor().result(&DocumentText::new("dispensado do exame")).unwrap().value,
            "Dispensado"
        );
    }
}
