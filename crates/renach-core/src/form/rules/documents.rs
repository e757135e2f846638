//! Identity document extraction: CPF, RENACH number, RG and its issuer.

use lazy_static::lazy_static;
use tracing::debug;

use super::dates::DateRules;
use super::patterns::{
    CPF_FORMATTED, CPF_LABEL, CPF_VALUE, EXPEDIDO_LABEL, ISSUING_BODY, ISSUING_BODY_WITH_UF,
    ORGAO_LABEL, RENACH_LABEL, RENACH_STATE_PREFIXED, RENACH_VALUE, RG_LABEL, RG_VALUE,
    SAO_PAULO_REFERENCE, UF_AFTER_SLASH, UF_AFTER_SPACE, UF_INLINE_TOKEN, UF_LABEL,
    UF_NEXT_LINE, UF_NEXT_LINE_TOKEN, UF_SAME_LINE,
};
use super::validators::{
    digits_of, format_cpf, is_valid_uf, length_between, looks_like_date, validate_cpf,
};
use super::{Candidate, FieldExtractor, Rule, RuleSet};
use crate::form::DocumentText;
use crate::form::fixtures::{DEFAULT_UF, is_home_state_municipality};
use crate::form::locator::{locate, window};
use crate::models::record::{ExtractedRecord, Field};

lazy_static! {
    static ref CPF_RULES: RuleSet = RuleSet::new(
        Field::Cpf,
        vec![
            Rule::anchored("cpf-label", &CPF_LABEL, &CPF_VALUE, 40, 0),
            Rule::unanchored("cpf-formatted", &CPF_FORMATTED, 1),
        ],
    );

    static ref RENACH_RULES: RuleSet = RuleSet::new(
        Field::NumeroRenach,
        vec![
            Rule::anchored("renach-label", &RENACH_LABEL, &RENACH_VALUE, 60, 0),
            Rule::unanchored("renach-state-prefixed", &RENACH_STATE_PREFIXED, 1),
        ],
    );

    static ref RG_RULES: RuleSet = RuleSet::new(
        Field::Rg,
        vec![Rule::anchored("rg-label", &RG_LABEL, &RG_VALUE, 40, 0)],
    );

    static ref ORGAO_RULES: RuleSet = RuleSet::new(
        Field::OrgaoExpedidor,
        vec![
            Rule::anchored("orgao-label", &ORGAO_LABEL, &ISSUING_BODY, 40, 0),
            Rule::unanchored("orgao-with-uf", &ISSUING_BODY_WITH_UF, 1),
        ],
    );

    static ref UF_RULES: RuleSet = RuleSet::new(
        Field::UfRg,
        vec![
            Rule::anchored("uf-same-line", &UF_LABEL, &UF_SAME_LINE, 12, 0),
            Rule::anchored("uf-next-line", &UF_LABEL, &UF_NEXT_LINE, 40, 1),
            Rule::anchored("orgao-slash-uf", &ISSUING_BODY, &UF_AFTER_SLASH, 8, 2),
            Rule::anchored("orgao-space-uf", &ISSUING_BODY, &UF_AFTER_SPACE, 6, 3),
            Rule::anchored("expedido-inline", &EXPEDIDO_LABEL, &UF_INLINE_TOKEN, 50, 4),
            Rule::anchored("expedido-next-line", &EXPEDIDO_LABEL, &UF_NEXT_LINE_TOKEN, 120, 5),
        ],
    );
}

/// Birth date, CPF and RENACH number extractor.
pub struct IdentityExtractor {
    dates: DateRules,
    validate_cpf: bool,
}

impl IdentityExtractor {
    pub fn new(dates: DateRules) -> Self {
        Self {
            dates,
            validate_cpf: true,
        }
    }

    /// Set whether to validate CPF check digits.
    pub fn with_cpf_validation(mut self, validate: bool) -> Self {
        self.validate_cpf = validate;
        self
    }

    pub fn cpf(&self, doc: &DocumentText<'_>) -> Option<Candidate> {
        CPF_RULES.first(doc, |_, hit| {
            if hit.char_before().is_some_and(|c| c.is_ascii_digit()) {
                return None;
            }
            let digits = digits_of(hit.value());
            if digits.len() != 11 || (self.validate_cpf && !validate_cpf(&digits)) {
                return None;
            }
            Some(format_cpf(&digits))
        })
    }

    /// RENACH number, never the CPF digits.
    pub fn renach(&self, doc: &DocumentText<'_>, cpf: Option<&str>) -> Option<Candidate> {
        let cpf_digits = cpf.map(digits_of);
        RENACH_RULES.first(doc, |_, hit| {
            let value = hit.value();
            (cpf_digits.as_deref() != Some(value)).then(|| value.to_string())
        })
    }
}

impl Default for IdentityExtractor {
    fn default() -> Self {
        Self::new(DateRules::default())
    }
}

impl FieldExtractor for IdentityExtractor {
    fn family(&self) -> &'static str {
        "identity"
    }

    fn extract(&self, doc: &DocumentText<'_>, _prior: &ExtractedRecord) -> Vec<Candidate> {
        let cpf = self.cpf(doc);
        let renach = self.renach(doc, cpf.as_ref().map(|c| c.value.as_str()));
        self.dates
            .birth(doc)
            .into_iter()
            .chain(cpf)
            .chain(renach)
            .collect()
    }
}

/// RG number, issuing body and issuing state extractor.
pub struct RgExtractor {
    uf_fallback: bool,
}

impl RgExtractor {
    pub fn new() -> Self {
        Self { uf_fallback: true }
    }

    /// Set whether a missing issuing state falls back to the home state.
    pub fn with_uf_fallback(mut self, enabled: bool) -> Self {
        self.uf_fallback = enabled;
        self
    }

    /// RG number, rejecting the CPF and anything date-shaped.
    pub fn rg(&self, doc: &DocumentText<'_>, cpf: Option<&str>) -> Option<Candidate> {
        let cpf_digits = cpf.map(digits_of);
        RG_RULES.first(doc, |_, hit| {
            let value = hit.value();
            let digits = digits_of(value);
            if !length_between(&digits, 5, 14) || looks_like_date(value) {
                return None;
            }
            (cpf_digits.as_deref() != Some(digits.as_str())).then(|| value.to_uppercase())
        })
    }

    pub fn issuing_body(&self, doc: &DocumentText<'_>) -> Option<Candidate> {
        ORGAO_RULES.first(doc, |_, hit| Some(hit.value().to_string()))
    }

    /// Issuing state from the six anchored patterns, then the fallback.
    pub fn issuing_state(
        &self,
        doc: &DocumentText<'_>,
        prior: &ExtractedRecord,
    ) -> Option<Candidate> {
        let found = UF_RULES.first(doc, |_, hit| {
            is_valid_uf(hit.value()).then(|| hit.value().to_string())
        });
        if found.is_some() || !self.uf_fallback {
            return found;
        }

        if self.references_sao_paulo(doc, prior) {
            debug!("uf_rg: no pattern matched, São Paulo referenced");
            Some(Candidate::new(Field::UfRg, DEFAULT_UF, "uf-fallback-sao-paulo-reference", 6))
        } else {
            debug!("uf_rg: no pattern matched, using default {}", DEFAULT_UF);
            Some(Candidate::new(Field::UfRg, DEFAULT_UF, "uf-fallback-default", 7))
        }
    }

    fn references_sao_paulo(&self, doc: &DocumentText<'_>, prior: &ExtractedRecord) -> bool {
        let text = doc.as_str();
        let issuer_text = locate(text, &ORGAO_LABEL).map(|a| window(text, a.end, 40).text);
        issuer_text.is_some_and(|t| SAO_PAULO_REFERENCE.is_match(t))
            || prior
                .get(Field::Municipio)
                .is_some_and(is_home_state_municipality)
    }
}

impl Default for RgExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for RgExtractor {
    fn family(&self) -> &'static str {
        "rg"
    }

    fn extract(&self, doc: &DocumentText<'_>, prior: &ExtractedRecord) -> Vec<Candidate> {
        self.rg(doc, prior.get(Field::Cpf))
            .into_iter()
            .chain(self.issuing_body(doc))
            .chain(self.issuing_state(doc, prior))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uf(text: &str, prior: &ExtractedRecord) -> Option<Candidate> {
        RgExtractor::new().issuing_state(&DocumentText::new(text), prior)
    }

    #[test]
    fn test_cpf_labeled_and_validated() {
        let ex = IdentityExtractor::default();
        let doc = DocumentText::new("CPF: 111.111.111-11 / 52998224725");
        // First is a repeated digit, the labeled window still reaches the second.
        assert_eq!(ex.cpf(&doc).unwrap().value, "529.982.247-25");

        let lax = IdentityExtractor::default().with_cpf_validation(false);
        assert_eq!(lax.cpf(&doc).unwrap().value, "111.111.111-11");
    }

    #[test]
    fn test_renach_skips_cpf_digits() {
        let ex = IdentityExtractor::default();
        let doc = DocumentText::new("RENACH: 52998224725 SP123456789");
        let renach = ex.renach(&doc, Some("529.982.247-25")).unwrap();
        assert_eq!(renach.value, "SP123456789");
    }

    #[test]
    fn test_rg_and_issuer() {
        let ex = RgExtractor::new();
        let doc = DocumentText::new("RG: 12.345.678-9   Órgão Emissor: SSP/SP");
        assert_eq!(ex.rg(&doc, None).unwrap().value, "12.345.678-9");
        assert_eq!(ex.issuing_body(&doc).unwrap().value, "SSP");
        let state = ex.issuing_state(&doc, &ExtractedRecord::new()).unwrap();
        assert_eq!(state.value, "SP");
        assert_eq!(state.source, "orgao-slash-uf");
    }

    #[test]
    fn test_uf_label_same_and_next_line() {
        let none = ExtractedRecord::new();
        assert_eq!(uf("UF: MG\n", &none).unwrap().source, "uf-same-line");
        let c = uf("UF\nRJ\n", &none).unwrap();
        assert_eq!((c.value.as_str(), c.source), ("RJ", "uf-next-line"));
    }

    #[test]
    fn test_invalid_uf_token_rejected() {
        let none = ExtractedRecord::new();
        let c = uf("UF: XX\nExpedido em 01/01/2010 - PR", &none).unwrap();
        assert_eq!((c.value.as_str(), c.source), ("PR", "expedido-inline"));
    }

    #[test]
    fn test_uf_fallbacks() {
        let mut prior = ExtractedRecord::new();
        assert_eq!(uf("sem dados", &prior).unwrap().source, "uf-fallback-default");

        prior.accept(Field::Municipio, "JUNDIAÍ");
        let c = uf("sem dados", &prior).unwrap();
        assert_eq!((c.value.as_str(), c.source), ("SP", "uf-fallback-sao-paulo-reference"));

        let off = RgExtractor::new().with_uf_fallback(false);
        assert!(off
            .issuing_state(&DocumentText::new("sem dados"), &prior)
            .is_none());
    }
}
