//! RENACH form parser: runs the field families and assembles the record.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::models::config::ExtractionConfig;
use crate::models::record::{ExtractedRecord, Field};

use super::DocumentText;
use super::rules::{
    AddressExtractor, CategoryExtractor, DateRules, ExamExtractor, FieldExtractor,
    IdentityExtractor, NamesExtractor, PhoneExtractor, ProcessExtractor, RgExtractor,
};

/// Fields reported as warnings when missing.
const IMPORTANT_FIELDS: [Field; 3] = [Field::Nome, Field::Categoria, Field::ResultadoExame];

/// Result of parsing one form's text.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Extracted fields.
    pub record: ExtractedRecord,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for form parsing.
pub trait FormParser {
    /// Parse a form from its text.
    fn parse(&self, text: &str) -> ParseResult;
}

/// Rule-based RENACH form parser.
pub struct RenachParser {
    /// Reference for year plausibility bands.
    reference_date: Option<NaiveDate>,
    /// Whether a missing RG state falls back to the home state.
    uf_fallback: bool,
    /// Whether to validate CPF check digits.
    validate_cpf: bool,
}

impl RenachParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        Self {
            reference_date: None,
            uf_fallback: true,
            validate_cpf: true,
        }
    }

    /// Create a parser from the extraction section of the configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            reference_date: config.reference_date,
            uf_fallback: config.uf_fallback,
            validate_cpf: config.validate_cpf,
        }
    }

    /// Set the date year bands are computed from (default: today).
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Set the RG state fallback.
    pub fn with_uf_fallback(mut self, enabled: bool) -> Self {
        self.uf_fallback = enabled;
        self
    }

    /// Set CPF validation.
    pub fn with_cpf_validation(mut self, validate: bool) -> Self {
        self.validate_cpf = validate;
        self
    }

    fn dates(&self) -> DateRules {
        self.reference_date.map(DateRules::new).unwrap_or_default()
    }

    /// Field families in assembly order.
    fn families(&self) -> Vec<Box<dyn FieldExtractor>> {
        let dates = self.dates();
        vec![
            Box::new(NamesExtractor::new()),
            Box::new(IdentityExtractor::new(dates).with_cpf_validation(self.validate_cpf)),
            Box::new(ProcessExtractor::new()),
            Box::new(CategoryExtractor::new(dates)),
            Box::new(PhoneExtractor::new()),
            Box::new(AddressExtractor::new()),
            Box::new(RgExtractor::new().with_uf_fallback(self.uf_fallback)),
            Box::new(ExamExtractor::new(dates)),
        ]
    }
}

impl Default for RenachParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormParser for RenachParser {
    fn parse(&self, text: &str) -> ParseResult {
        let start = Instant::now();
        let doc = DocumentText::new(text);

        info!("Parsing RENACH form from {} characters of text", text.len());

        let mut record = ExtractedRecord::new();
        for family in self.families() {
            let found = family.extract(&doc, &record);
            debug!("{}: {} candidates", family.family(), found.len());

            for candidate in found {
                let field = candidate.field;
                if record.accept(field, candidate.value) {
                    debug!("{} <- {} (priority {})", field, candidate.source, candidate.priority);
                }
            }
        }

        // Composite address only once every fragment is settled.
        if let Some(address) = compose_address(&record) {
            record.accept(Field::Endereco, address);
        }

        let warnings: Vec<String> = IMPORTANT_FIELDS
            .iter()
            .filter(|f| !record.contains(**f))
            .map(|f| format!("Could not extract {}", f.key()))
            .collect();

        debug!("Extracted {} fields, {} warnings", record.len(), warnings.len());

        ParseResult {
            record,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Build the one-line address from the fragments that are present.
///
/// `"{logradouro}, {numero} - {complemento} - {bairro} - {municipio} - CEP {cep}"`,
/// skipping absent parts. Returns `None` when no fragment is present.
pub fn compose_address(record: &ExtractedRecord) -> Option<String> {
    let street = match (record.get(Field::Logradouro), record.get(Field::Numero)) {
        (Some(street), Some(number)) => Some(format!("{street}, {number}")),
        (Some(street), None) => Some(street.to_string()),
        (None, Some(number)) => Some(number.to_string()),
        (None, None) => None,
    };

    let parts: Vec<String> = street
        .into_iter()
        .chain(record.get(Field::Complemento).map(str::to_string))
        .chain(record.get(Field::Bairro).map(str::to_string))
        .chain(record.get(Field::Municipio).map(str::to_string))
        .chain(record.get(Field::Cep).map(|cep| format!("CEP {cep}")))
        .collect();

    (!parts.is_empty()).then(|| parts.join(" - "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> RenachParser {
        RenachParser::new().with_reference_date(NaiveDate::from_ymd_opt(2025, 5, 20).unwrap())
    }

    #[test]
    fn test_parse_basic_form() {
        let text = "Nome:\nPai:\nMãe:\nJHORDAN CANDIDO DOS SANTOS SIMEAO\nADALBERTO DA SILVA SIMEAO\nELISANGELA DOS SANTOS\n\
                    CPF: 529.982.247-25\nTipo de Processo: RENOVAÇÃO\nSituação Atual: B\n\
                    Resultado: Apto\n";

        let result = parser().parse(text);
        let record = &result.record;

        assert_eq!(record.get(Field::Nome), Some("JHORDAN CANDIDO DOS SANTOS SIMEAO"));
        assert_eq!(record.get(Field::Cpf), Some("529.982.247-25"));
        assert_eq!(record.get(Field::TipoProcesso), Some("Renovação"));
        assert_eq!(record.get(Field::Categoria), Some("B"));
        assert_eq!(record.get(Field::ResultadoExame), Some("Apto"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_fields_are_absent_and_warned() {
        let result = parser().with_uf_fallback(false).parse("texto sem campos");
        assert!(result.record.is_empty());
        assert!(!result.record.contains(Field::Endereco));
        assert_eq!(result.warnings.len(), IMPORTANT_FIELDS.len());
    }

    #[test]
    fn test_compose_address() {
        let mut record = ExtractedRecord::new();
        assert_eq!(compose_address(&record), None);

        record.accept(Field::Logradouro, "RUA DAS FLORES");
        record.accept(Field::Numero, "123");
        record.accept(Field::Municipio, "JUNDIAÍ");
        record.accept(Field::Cep, "13201-005");
        assert_eq!(
            compose_address(&record).as_deref(),
            Some("RUA DAS FLORES, 123 - JUNDIAÍ - CEP 13201-005")
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "Nome: CARLOS PEREIRA\nCategoria Pretendida: AB\nLaudo 1563\nRua Sete, 10\n";
        let first = serde_json::to_string(&parser().parse(text).record).unwrap();
        let second = serde_json::to_string(&parser().parse(text).record).unwrap();
        assert_eq!(first, second);
    }
}
