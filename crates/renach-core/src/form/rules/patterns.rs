//! Common regex patterns for RENACH form extraction.
//!
//! Labels are case-insensitive and accept both accented and unaccented
//! spellings. Value patterns put the value in capture group 1.

use lazy_static::lazy_static;
use regex::Regex;

use crate::form::fixtures::{ISSUING_BODIES, KNOWN_MUNICIPALITIES};
use crate::form::locator::tolerant_pattern;

lazy_static! {
    // Person names
    pub static ref NAME_LABELS_BLOCK: Regex = Regex::new(
        r"(?i)\bnome\s*:?\s*(?:nome\s+do\s+)?pai\s*:?\s*(?:nome\s+da\s+)?m[ãa]e\b\s*:?"
    ).unwrap();

    pub static ref NOME_LABEL: Regex = Regex::new(
        r"(?i)\bnome\b(?:\s+(?:completo|do\s+candidato|civil))?\s*:?"
    ).unwrap();

    pub static ref NOME_PARENT_SUFFIX: Regex = Regex::new(
        r"(?i)^\s*d[oa]\s+(?:pai|m[ãa]e)\b"
    ).unwrap();

    pub static ref PAI_LABEL: Regex = Regex::new(
        r"(?i)\b(?:nome\s+do\s+)?pai\b\s*:?"
    ).unwrap();

    pub static ref MAE_LABEL: Regex = Regex::new(
        r"(?i)\b(?:nome\s+da\s+)?m[ãa]e\b\s*:?"
    ).unwrap();

    pub static ref NAME_LABEL_LINE: Regex = Regex::new(
        r"(?i)^\s*(?:nome(?:\s+d[oa]\s+(?:pai|m[ãa]e))?|pai|m[ãa]e|filia[çc][ãa]o)\s*:?\s*$"
    ).unwrap();

    // Dates
    pub static ref DATE_VALUE: Regex = Regex::new(
        r"\b(\d{2}/\d{2}/\d{4})\b"
    ).unwrap();

    pub static ref DATE_SHAPE: Regex = Regex::new(
        r"\d{1,2}\s*[/.\-]\s*\d{1,2}\s*[/.\-]\s*\d{2,4}"
    ).unwrap();

    pub static ref NASCIMENTO_LABEL: Regex = Regex::new(
        r"(?i)\bdata\s+(?:de\s+)?nasc(?:imento)?\b\.?|\bnascimento\b|\bdt\.?\s*nasc\b\.?"
    ).unwrap();

    pub static ref EXAME_DATE_LABEL: Regex = Regex::new(
        r"(?i)\bdata\s+d[oa]\s+(?:exame|avalia[çc][ãa]o)\b"
    ).unwrap();

    pub static ref LAUDO_DATE_LABEL: Regex = Regex::new(
        r"(?i)\bdata\s+d[oa]\s+laudo\b"
    ).unwrap();

    pub static ref PRIMEIRA_HAB_LABEL: Regex = Regex::new(
        r"(?i)\b(?:primeira|1[ªa]\.?)\s+habilita[çc][ãa]o\b\s*:?"
    ).unwrap();

    pub static ref PRIMEIRA_HAB_SHORT_LABEL: Regex = Regex::new(
        r"(?i)\b(?:data\s+(?:da\s+)?)?1[ªa]\.?\s*hab\b\.?"
    ).unwrap();

    // CNH category
    pub static ref CATEGORIA_PRETENDIDA_LABEL: Regex = Regex::new(
        r"(?i)\bcategoria\s+pretendida\b\s*:?"
    ).unwrap();

    pub static ref SITUACAO_ATUAL_LABEL: Regex = Regex::new(
        r"(?i)\bsitua[çc][ãa]o\s+atual\b\s*:?"
    ).unwrap();

    pub static ref CATEGORIA_ATUAL_LABEL: Regex = Regex::new(
        r"(?i)\bcategoria\s+atual\b\s*:?"
    ).unwrap();

    pub static ref CATEGORY_ANCHOR_ANY: Regex = Regex::new(
        r"(?i)\bcategoria\b|\bsitua[çc][ãa]o\s+atual\b|\bprimeira\s+habilita[çc][ãa]o\b"
    ).unwrap();

    pub static ref CATEGORY_TOKEN: Regex = Regex::new(
        r"\b([A-E]{1,5})\b"
    ).unwrap();

    pub static ref CATEGORY_LINE: Regex = Regex::new(
        r"(?m)^[ \t]*([A-E]{1,5})[ \t]*\r?$"
    ).unwrap();

    // Process type
    pub static ref TIPO_PROCESSO_LABEL: Regex = Regex::new(
        r"(?i)\btipo\s+(?:de\s+)?processo\b\s*:?"
    ).unwrap();

    pub static ref SERVICO_LABEL: Regex = Regex::new(
        r"(?i)\bservi[çc]o\b\s*:?"
    ).unwrap();

    pub static ref PROCESSO_LABEL: Regex = Regex::new(
        r"(?i)\bprocesso\b\s*:?"
    ).unwrap();

    pub static ref WHOLE_WINDOW: Regex = Regex::new(
        r"(?s).+"
    ).unwrap();

    pub static ref TIPO_PROCESSO_LINE: Regex = Regex::new(
        r"(?i)\btipo\s+(?:de\s+)?processo\b[ \t]*:?[ \t]*([^\n]+)"
    ).unwrap();

    pub static ref PROCESSO_LINE: Regex = Regex::new(
        r"(?im)^[ \t]*processo[ \t]*:?[ \t]*([^\n]+)"
    ).unwrap();

    // Phone
    pub static ref TELEFONE_LABEL: Regex = Regex::new(
        r"(?i)\b(?:telefone|celular|fone|tel)\b\.?\s*:?"
    ).unwrap();

    pub static ref PHONE_VALUE: Regex = Regex::new(
        r"(\(?\d{2}\)?[\s.\-]?9?\d{4}[\s.\-]?\d{4})\b"
    ).unwrap();

    // Address
    pub static ref LOGRADOURO_LABEL: Regex = Regex::new(
        r"(?i)\b(?:logradouro|endere[çc]o)\b\s*:?"
    ).unwrap();

    pub static ref STREET_PREFIXED: Regex = Regex::new(
        r"(?i)\b((?:r\.|rua|av\.?|avenida|travessa|tv\.|alameda|al\.|estrada|rodovia|rod\.|pra[çc]a)\s+[^\n,;]{2,80})"
    ).unwrap();

    pub static ref STREET_PREFIXED_UPPER: Regex = Regex::new(
        r"\b((?:R\.|RUA|Rua|AV\.?|Av\.?|AVENIDA|Avenida)\s+[A-ZÀ-Ú][^\n,;]{2,80})"
    ).unwrap();

    pub static ref STREET_TRAILING_NUMBER: Regex = Regex::new(
        r"(?i)(?:\s*[,\-]\s*|\s+)(?:n[°º.o]?\s*)?(?:\d{1,5}[A-Z]?|s/?n)\s*$"
    ).unwrap();

    pub static ref NUMERO_LABELED: Regex = Regex::new(
        r"(?i)\b(?:n[úu]mero|n[°º.o])\s*:?\s*(\d{1,5}|s/?n)\b"
    ).unwrap();

    pub static ref NUMERO_LABEL: Regex = Regex::new(
        r"(?i)\bn[úu]mero\b\s*:?"
    ).unwrap();

    pub static ref HOUSE_NUMBER: Regex = Regex::new(
        r"\b(\d{1,5}|S/?N)\b"
    ).unwrap();

    pub static ref ADDRESS_END_MARKER: Regex = Regex::new(
        r"(?i)\b(?:complemento|bairro|cep)\b"
    ).unwrap();

    pub static ref COMPLEMENTO_LABEL: Regex = Regex::new(
        r"(?i)\bcomplemento\b\s*:?"
    ).unwrap();

    pub static ref BAIRRO_LABEL: Regex = Regex::new(
        r"(?i)\bbairro\b\s*:?"
    ).unwrap();

    pub static ref ANY_FIELD_LABEL: Regex = Regex::new(
        r"(?i)^\s*(?:logradouro|endere[çc]o|n[úu]mero|complemento|bairro|cep|munic[íi]pio|uf|telefone|celular|rg|cpf|c[óo]d(?:igo)?\.?\s+(?:do\s+)?munic[íi]pio)\b"
    ).unwrap();

    pub static ref CEP_LABEL: Regex = Regex::new(
        r"(?i)\bcep\b\s*:?"
    ).unwrap();

    pub static ref CEP_VALUE: Regex = Regex::new(
        r"\b(\d{5}-?\d{3})\b"
    ).unwrap();

    pub static ref CEP_FORMATTED: Regex = Regex::new(
        r"\b(\d{5}-\d{3})\b"
    ).unwrap();

    pub static ref MUNICIPIO_LABEL: Regex = Regex::new(
        r"(?i)\bmunic[íi]pio\b\s*:?"
    ).unwrap();

    pub static ref CODIGO_MUNICIPIO_LABEL: Regex = Regex::new(
        r"(?i)\bc[óo]d(?:igo)?\.?\s*(?:d[oe]\s+)?munic[íi]pio\b\s*:?"
    ).unwrap();

    pub static ref MUNICIPIO_CODE_VALUE: Regex = Regex::new(
        r"^\s*(\d{4,7})\b"
    ).unwrap();

    pub static ref MUNICIPIO_NAME_VALUE: Regex = Regex::new(
        r"^[ \t]*([A-ZÀ-Úa-zà-ú][A-ZÀ-Úa-zà-ú' \-]{1,50})"
    ).unwrap();

    pub static ref MUNICIPIO_WITH_CODE: Regex = Regex::new(&format!(
        r"(?i)\b(\d{{5}})\s*((?:{}))\b",
        KNOWN_MUNICIPALITIES
            .iter()
            .map(|m| tolerant_pattern(m))
            .collect::<Vec<_>>()
            .join("|")
    )).unwrap();

    // Identity documents
    pub static ref CPF_LABEL: Regex = Regex::new(
        r"(?i)\bcpf\b\s*(?:n[°º.o]?\s*)?:?"
    ).unwrap();

    pub static ref CPF_VALUE: Regex = Regex::new(
        r"\b(\d{3}\.?\d{3}\.?\d{3}-?\d{2})\b"
    ).unwrap();

    pub static ref CPF_FORMATTED: Regex = Regex::new(
        r"\b(\d{3}\.\d{3}\.\d{3}-\d{2})\b"
    ).unwrap();

    pub static ref RENACH_LABEL: Regex = Regex::new(
        r"(?i)\b(?:n[°º.o]?\s*(?:do\s+)?)?renach\b\s*:?"
    ).unwrap();

    pub static ref RENACH_VALUE: Regex = Regex::new(
        r"\b([A-Z]{2}\d{9}|\d{9,11})\b"
    ).unwrap();

    pub static ref RENACH_STATE_PREFIXED: Regex = Regex::new(
        r"\b([A-Z]{2}\d{9})\b"
    ).unwrap();

    pub static ref RG_LABEL: Regex = Regex::new(
        r"(?i)\b(?:rg|identidade)\b\s*(?:n[°º.o]?\s*)?:?"
    ).unwrap();

    pub static ref RG_VALUE: Regex = Regex::new(
        r"\b(\d[\d.\-]{3,13}[\dXx])\b"
    ).unwrap();

    pub static ref ORGAO_LABEL: Regex = Regex::new(
        r"(?i)(?:\b[óo]rg[ãa]o\s+(?:emissor|expedidor)\b|\borg\.?\s*exp(?:edidor)?\b\.?|\bemissor\b)\s*:?"
    ).unwrap();

    pub static ref ISSUING_BODY: Regex = Regex::new(&format!(
        r"\b({})\b",
        ISSUING_BODIES.join("|")
    )).unwrap();

    pub static ref ISSUING_BODY_WITH_UF: Regex = Regex::new(&format!(
        r"\b({})\s*[/\-]\s*[A-Z]{{2}}\b",
        ISSUING_BODIES.join("|")
    )).unwrap();

    pub static ref UF_LABEL: Regex = Regex::new(
        r"(?i)\buf\b(?:\s+(?:do\s+rg|emissor|expedidor))?"
    ).unwrap();

    pub static ref UF_SAME_LINE: Regex = Regex::new(
        r"^[ \t]*:?[ \t]*([A-Z]{2})\b"
    ).unwrap();

    pub static ref UF_NEXT_LINE: Regex = Regex::new(
        r"^[^\n]*\n\s*([A-Z]{2})\b"
    ).unwrap();

    pub static ref UF_AFTER_SLASH: Regex = Regex::new(
        r"^\s*[/\-]\s*([A-Z]{2})\b"
    ).unwrap();

    pub static ref UF_AFTER_SPACE: Regex = Regex::new(
        r"^[ \t]+([A-Z]{2})\b"
    ).unwrap();

    pub static ref EXPEDIDO_LABEL: Regex = Regex::new(
        r"(?i)\bexpedid[oa]\b"
    ).unwrap();

    pub static ref UF_INLINE_TOKEN: Regex = Regex::new(
        r"[/\-\s]([A-Z]{2})\b"
    ).unwrap();

    pub static ref UF_NEXT_LINE_TOKEN: Regex = Regex::new(
        r"\n[^\n]*?\b([A-Z]{2})\b"
    ).unwrap();

    pub static ref SAO_PAULO_REFERENCE: Regex = Regex::new(
        r"(?i)s[ãa]o\s+paulo|[/\-\s]SP\b"
    ).unwrap();

    // Exam section
    pub static ref CREDENCIADO_LABEL: Regex = Regex::new(
        r"(?i)\b(?:n[°º.o]?\s*(?:do\s+)?)?credenciad[oa]\b\s*:?"
    ).unwrap();

    pub static ref CREDENCIADO_VALUE: Regex = Regex::new(
        r"^\s*(\d{1,6})\b"
    ).unwrap();

    pub static ref LAUDO_NUMBER_LABEL: Regex = Regex::new(
        r"(?i)\bn[°º.o]?\s*(?:do\s+)?laudo\b\s*:?"
    ).unwrap();

    pub static ref LAUDO_NUMBER_LABEL_REVERSED: Regex = Regex::new(
        r"(?i)\blaudo\s*(?:n[°º.o]?|n[úu]mero)\s*:?"
    ).unwrap();

    pub static ref LAUDO_NUMBER_VALUE: Regex = Regex::new(
        r"^\s*(\d{3,6})\b"
    ).unwrap();

    pub static ref LAUDO_WORD: Regex = Regex::new(
        r"(?i)\blaudos?\b"
    ).unwrap();

    pub static ref SHORT_ID: Regex = Regex::new(
        r"\b(\d{3,4})\b"
    ).unwrap();

    pub static ref RESULTADO_LABEL: Regex = Regex::new(
        r"(?i)\bresultado\b(?:\s+d[oa]\s+(?:exame|avalia[çc][ãa]o))?\s*:?"
    ).unwrap();

    pub static ref INAPTO_TEMPORARIO: Regex = Regex::new(
        r"(?i)\binapto\s+tempor[áa]rio\b"
    ).unwrap();

    pub static ref INAPTO: Regex = Regex::new(
        r"(?i)\binapto\b"
    ).unwrap();

    pub static ref APTO: Regex = Regex::new(
        r"(?i)\bapto\b"
    ).unwrap();

    pub static ref DISPENSADO: Regex = Regex::new(
        r"(?i)\bdispensad[oa]\b"
    ).unwrap();

    pub static ref TEMPORARIO: Regex = Regex::new(
        r"(?i)\btempor[áa]rio\b"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_block_variants() {
        assert!(NAME_LABELS_BLOCK.is_match("Nome:\nPai:\nMãe:"));
        assert!(NAME_LABELS_BLOCK.is_match("NOME\nNOME DO PAI\nNOME DA MAE"));
        assert!(!NAME_LABELS_BLOCK.is_match("Nome: JOSE\nPai: ANTONIO\nMãe: ANA"));
    }

    #[test]
    fn test_municipality_with_code_tolerates_newlines() {
        let caps = MUNICIPIO_WITH_CODE.captures("Cód.\n  12345 \n\n JUNDIAI\n").unwrap();
        assert_eq!(&caps[1], "12345");
        assert_eq!(&caps[2], "JUNDIAI");
    }

    #[test]
    fn test_municipality_code_ignores_cep_digits() {
        assert!(MUNICIPIO_WITH_CODE.captures("13201-005 JUNDIAÍ").is_none());
    }

    #[test]
    fn test_inapto_does_not_match_apto() {
        assert!(!APTO.is_match("Inapto"));
        assert!(INAPTO_TEMPORARIO.is_match("INAPTO TEMPORARIO"));
    }

    #[test]
    fn test_street_trailing_number() {
        let street = "RUA DAS FLORES, 123";
        let m = STREET_TRAILING_NUMBER.find(street).unwrap();
        assert_eq!(&street[..m.start()], "RUA DAS FLORES");
    }
}
