//! Process type extraction (Renovação, Primeira Habilitação, ...).

use lazy_static::lazy_static;

use super::patterns::{
    PROCESSO_LABEL, PROCESSO_LINE, SERVICO_LABEL, TIPO_PROCESSO_LABEL, TIPO_PROCESSO_LINE,
    WHOLE_WINDOW,
};
use super::validators::length_between;
use super::{Candidate, FieldExtractor, Rule, RuleSet};
use crate::form::DocumentText;
use crate::form::fixtures::normalize_spaces;
use crate::form::locator::fold;
use crate::models::record::{ExtractedRecord, Field};

const PROCESS_WINDOW: usize = 60;

/// Folded keyword and the canonical process it stands for.
const CANONICAL_PROCESSES: [(&str, &str); 13] = [
    ("reabilit", "Reabilitação"),
    ("renov", "Renovação"),
    ("primeira hab", "Primeira Habilitação"),
    ("1a hab", "Primeira Habilitação"),
    ("1ª hab", "Primeira Habilitação"),
    ("adicao", "Adição de Categoria"),
    ("mudanca", "Mudança de Categoria"),
    ("segunda via", "Segunda Via"),
    ("2a via", "Segunda Via"),
    ("2ª via", "Segunda Via"),
    ("transfer", "Transferência"),
    ("alteracao de dados", "Alteração de Dados"),
    ("alteracao dados", "Alteração de Dados"),
];

/// Folded label texts that must never be returned as a value.
const BARE_LABELS: [&str; 4] = ["processo", "tipo de processo", "tipo processo", "servico"];

lazy_static! {
    static ref PROCESS_RULES: RuleSet = RuleSet::new(
        Field::TipoProcesso,
        vec![
            Rule::anchored("tipo-processo", &TIPO_PROCESSO_LABEL, &WHOLE_WINDOW, PROCESS_WINDOW, 0),
            Rule::anchored("servico", &SERVICO_LABEL, &WHOLE_WINDOW, PROCESS_WINDOW, 1),
            Rule::anchored("processo", &PROCESSO_LABEL, &WHOLE_WINDOW, PROCESS_WINDOW, 2),
            Rule::unanchored("tipo-processo-line", &TIPO_PROCESSO_LINE, 3),
            Rule::unanchored("processo-line", &PROCESSO_LINE, 4),
        ],
    );
}

/// Process type extractor.
pub struct ProcessExtractor;

impl ProcessExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for ProcessExtractor {
    fn family(&self) -> &'static str {
        "process"
    }

    fn extract(&self, doc: &DocumentText<'_>, _prior: &ExtractedRecord) -> Vec<Candidate> {
        PROCESS_RULES
            .first(doc, |rule, hit| {
                if rule.anchor.is_some() {
                    snap(leading_lines(hit.value(), 2)).map(str::to_string)
                } else {
                    raw_process(hit.value())
                }
            })
            .into_iter()
            .collect()
    }
}

/// Canonical process named by the earliest keyword in `text`.
pub fn snap(text: &str) -> Option<&'static str> {
    let folded = fold(text);
    CANONICAL_PROCESSES
        .iter()
        .filter_map(|(keyword, canonical)| folded.find(keyword).map(|pos| (pos, *canonical)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, canonical)| canonical)
}

/// Label-line value: canonical when it names a process, else kept verbatim.
fn raw_process(value: &str) -> Option<String> {
    if let Some(canonical) = snap(value) {
        return Some(canonical.to_string());
    }
    let value = normalize_spaces(value);
    let folded = fold(&value);
    let folded = folded.trim_end_matches(':').trim();
    (length_between(&value, 3, 50) && !BARE_LABELS.contains(&folded)).then_some(value)
}

/// The first `n` non-empty lines of `text`.
fn leading_lines(text: &str, n: usize) -> &str {
    let mut seen = 0;
    let mut end = 0;
    for line in text.split_inclusive('\n') {
        end += line.len();
        if !line.trim().is_empty() {
            seen += 1;
            if seen == n {
                return &text[..end];
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(text: &str) -> Option<String> {
        ProcessExtractor::new()
            .extract(&DocumentText::new(text), &ExtractedRecord::new())
            .pop()
            .map(|c| c.value)
    }

    #[test]
    fn test_snap_to_canonical() {
        assert_eq!(snap("RENOVACAO DE EXAMES"), Some("Renovação"));
        assert_eq!(snap("1a Habilitação"), Some("Primeira Habilitação"));
        assert_eq!(snap("adição de categoria"), Some("Adição de Categoria"));
        assert_eq!(snap("nada"), None);
    }

    #[test]
    fn test_label_window_across_lines() {
        assert_eq!(
            process("Tipo de Processo:\n\n   RENOVAÇÃO\nCategoria: B"),
            Some("Renovação".to_string())
        );
    }

    #[test]
    fn test_window_ignores_lines_far_below() {
        let text = "Tipo de Processo:\n\n\nXYZ\nNome:\nPrimeira Habilitação: 01/01/2000";
        assert_eq!(process(text), None);
    }

    #[test]
    fn test_raw_fallback_and_label_guard() {
        assert_eq!(process("Processo: CNH DEFINITIVA"), Some("CNH DEFINITIVA".to_string()));
        assert_eq!(process("Tipo de Processo:\n"), None);
    }

    #[test]
    fn test_raw_fallback_length_bound() {
        let long = format!("Processo: {}", "X".repeat(60));
        assert_eq!(process(&long), None);
    }
}
