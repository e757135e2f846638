//! CNH category extraction.
//!
//! A category is one to five letters from A to E, which makes it easy to
//! confuse with stray capitals in headers and with the issuing authority's
//! internal codes such as `ACC`. A token is accepted only when it stands
//! isolated after one of the category anchors, and the anchors are ranked
//! explicitly rather than by where they appear in the text.

use lazy_static::lazy_static;

use super::dates::DateRules;
use super::patterns::{
    CATEGORIA_ATUAL_LABEL, CATEGORIA_PRETENDIDA_LABEL, CATEGORY_ANCHOR_ANY, CATEGORY_LINE,
    CATEGORY_TOKEN, PRIMEIRA_HAB_LABEL, SITUACAO_ATUAL_LABEL,
};
use super::resolver::resolve;
use super::validators::is_isolated;
use super::{Candidate, FieldExtractor, Hit, Rule, RuleSet};
use crate::form::DocumentText;
use crate::form::locator::fold;
use crate::models::record::{ExtractedRecord, Field};

const CATEGORY_WINDOW: usize = 80;

/// Words that may follow a category token on the same line.
const STRUCTURAL_KEYWORDS: [&str; 15] = [
    "situacao", "categoria", "primeira", "data", "tipo", "renach", "cpf", "rg", "resultado",
    "exame", "validade", "habilitacao", "observac", "pretendida", "atual",
];

lazy_static! {
    static ref CATEGORY_RULES: RuleSet = RuleSet::new(
        Field::Categoria,
        vec![
            Rule::anchored(
                "categoria-pretendida",
                &CATEGORIA_PRETENDIDA_LABEL,
                &CATEGORY_TOKEN,
                CATEGORY_WINDOW,
                0,
            ),
            Rule::anchored(
                "situacao-atual",
                &SITUACAO_ATUAL_LABEL,
                &CATEGORY_TOKEN,
                CATEGORY_WINDOW,
                1,
            ),
            Rule::anchored(
                "primeira-habilitacao",
                &PRIMEIRA_HAB_LABEL,
                &CATEGORY_TOKEN,
                CATEGORY_WINDOW,
                2,
            ),
            Rule::anchored(
                "categoria-atual",
                &CATEGORIA_ATUAL_LABEL,
                &CATEGORY_TOKEN,
                CATEGORY_WINDOW,
                3,
            ),
            Rule::unanchored("category-line", &CATEGORY_LINE, 4),
        ],
    );
}

/// Category and first-license extractor.
pub struct CategoryExtractor {
    dates: DateRules,
}

impl CategoryExtractor {
    pub fn new(dates: DateRules) -> Self {
        Self { dates }
    }

    /// Resolved category, if any anchor yields an isolated token.
    pub fn category(&self, doc: &DocumentText<'_>) -> Option<Candidate> {
        resolve(CATEGORY_RULES.collect(doc, |rule, hit| {
            accept_token(rule, hit).then(|| hit.value().to_string())
        }))
    }
}

impl Default for CategoryExtractor {
    fn default() -> Self {
        Self::new(DateRules::default())
    }
}

impl FieldExtractor for CategoryExtractor {
    fn family(&self) -> &'static str {
        "category"
    }

    fn extract(&self, doc: &DocumentText<'_>, _prior: &ExtractedRecord) -> Vec<Candidate> {
        self.category(doc)
            .into_iter()
            .chain(self.dates.first_license(doc))
            .collect()
    }
}

fn accept_token(rule: &Rule, hit: &Hit<'_>) -> bool {
    let value = hit.value();

    // Suffix of an internal code (ACC) or glued to one.
    if value.ends_with("CC") || hit.after().starts_with("CC") {
        return false;
    }
    if !hit.char_before().is_none_or(|c| c.is_whitespace() || c == ':') {
        return false;
    }
    if !is_isolated(hit) {
        return false;
    }
    // A token past another category label belongs to that label.
    if rule.anchor.is_some() && CATEGORY_ANCHOR_ANY.is_match(hit.lead()) {
        return false;
    }

    isolated_on_right(hit.after())
}

/// Line break, a structural keyword, or a wide gap before the next word.
fn isolated_on_right(after: &str) -> bool {
    let rest = after.trim_start_matches([' ', '\t']);
    if rest.is_empty() || rest.starts_with(['\n', '\r']) {
        return true;
    }

    let folded = fold(rest);
    if STRUCTURAL_KEYWORDS.iter().any(|k| folded.starts_with(k)) {
        return true;
    }

    let gap = after.len() - rest.len();
    gap >= 3
        && rest
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(text: &str) -> Option<String> {
        CategoryExtractor::default()
            .category(&DocumentText::new(text))
            .map(|c| c.value)
    }

    #[test]
    fn test_token_on_its_own_line() {
        assert_eq!(category("Categoria Pretendida:\nAB\n"), Some("AB".to_string()));
        assert_eq!(category("Situação Atual: B\n"), Some("B".to_string()));
    }

    #[test]
    fn test_internal_code_rejected() {
        assert_eq!(category("Categoria Pretendida: ACC\n"), None);
        assert_eq!(category("Situacao Atual: BCC\n"), None);
    }

    #[test]
    fn test_priority_beats_position() {
        let text = "Primeira Habilitação: A\nCategoria Atual: D\nOutros\nSituação Atual: B\n";
        let c = CategoryExtractor::default()
            .category(&DocumentText::new(text))
            .unwrap();
        assert_eq!(c.value, "B");
        assert_eq!(c.source, "situacao-atual");

        let text = format!("{text}Categoria Pretendida: AE\n");
        assert_eq!(category(&text), Some("AE".to_string()));
    }

    #[test]
    fn test_situacao_atual_wins_in_form_order() {
        let text = "Primeira Habilitação: A\nSituação Atual: B\nCategoria Atual: D\n";
        let c = CategoryExtractor::default()
            .category(&DocumentText::new(text))
            .unwrap();
        assert_eq!(c.value, "B");
        assert_eq!(c.source, "situacao-atual");
    }

    #[test]
    fn test_token_before_structural_keyword() {
        assert_eq!(category("Categoria Atual: AB Validade 10/10/2030"), Some("AB".to_string()));
    }

    #[test]
    fn test_gap_before_capitalized_word() {
        assert_eq!(category("Categoria Atual: B    Renovação"), Some("B".to_string()));
        assert_eq!(category("Categoria Atual: B Renovação"), None);
    }

    #[test]
    fn test_stray_header_capitals_ignored() {
        assert_eq!(category("DETRAN DE SAO PAULO\nFORMULARIO RENACH\n"), None);
    }

    #[test]
    fn test_first_license_date_is_emitted() {
        let extractor = CategoryExtractor::new(DateRules::new(
            chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        ));
        let found = extractor.extract(
            &DocumentText::new("Primeira Habilitação: 05/05/2010\nSituação Atual: B\n"),
            &ExtractedRecord::new(),
        );
        let fields: Vec<_> = found.iter().map(|c| (c.field, c.value.as_str())).collect();
        assert_eq!(
            fields,
            vec![
                (Field::Categoria, "B"),
                (Field::DataPrimeiraHabilitacao, "05/05/2010"),
            ]
        );
    }
}
