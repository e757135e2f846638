//! Installation-specific tables.
//!
//! The street list, municipality list and the home-state fallback are tuned
//! for the forms this installation receives (DETRAN-SP, Jundiaí region).
//! Keep them here rather than inline in the rules.

use super::locator::fold;

/// Home state used when no RG issuing state can be read.
pub const DEFAULT_UF: &str = "SP";

/// The 27 Brazilian federative units.
pub const UFS: [&str; 27] = [
    "AC", "AL", "AM", "AP", "BA", "CE", "DF", "ES", "GO", "MA", "MG", "MS", "MT", "PA", "PB", "PE",
    "PI", "PR", "RJ", "RN", "RO", "RR", "RS", "SC", "SE", "SP", "TO",
];

/// RG issuing bodies seen on the forms.
pub const ISSUING_BODIES: [&str; 16] = [
    "SSP", "SESP", "SDS", "SEJUSP", "SJS", "IFP", "IGP", "SPTC", "PC", "PTC", "DETRAN", "DGPC",
    "POLITEC", "DPF", "MAER", "MEX",
];

/// Streets of the installation's customer base, canonical spelling.
pub const KNOWN_STREETS: [&str; 12] = [
    "AVENIDA NOVE DE JULHO",
    "AVENIDA JUNDIAÍ",
    "AVENIDA ANTÔNIO FREDERICO OZANAN",
    "AVENIDA DOS FERROVIÁRIOS",
    "AVENIDA SAMUEL MARTINS",
    "RUA BARÃO DE JUNDIAÍ",
    "RUA DO RETIRO",
    "RUA PETRONILHA ANTUNES",
    "RUA RANGEL PESTANA",
    "RUA VIGÁRIO JOÃO JOSÉ RODRIGUES",
    "RUA COLÔMBIA",
    "RUA SÃO JORGE",
];

/// Municipalities of the installation's region, canonical spelling.
pub const KNOWN_MUNICIPALITIES: [&str; 16] = [
    "SÃO PAULO",
    "JUNDIAÍ",
    "CAMPINAS",
    "ITUPEVA",
    "VÁRZEA PAULISTA",
    "CAMPO LIMPO PAULISTA",
    "LOUVEIRA",
    "CAJAMAR",
    "JARINU",
    "ITATIBA",
    "VINHEDO",
    "CABREÚVA",
    "SANTO ANDRÉ",
    "GUARULHOS",
    "OSASCO",
    "SOROCABA",
];

/// Uppercase tokens that stand alone on a line but are never a person's name.
pub const NON_NAME_TOKENS: [&str; 20] = [
    "CPF", "RG", "UF", "CEP", "RENACH", "ACC", "CNH", "SSP", "DETRAN", "SEXO", "MASCULINO",
    "FEMININO", "BRASILEIRO", "BRASILEIRA", "APTO", "INAPTO", "DISPENSADO", "NACIONALIDADE",
    "NATURALIDADE", "FILIAÇÃO",
];

pub fn is_valid_uf(token: &str) -> bool {
    UFS.contains(&token)
}

pub fn is_non_name_token(line: &str) -> bool {
    let folded = fold(line.trim());
    NON_NAME_TOKENS.iter().any(|t| fold(t) == folded)
}

/// Canonical municipality name for a spelling variant, if known.
pub fn canonical_municipality(name: &str) -> Option<&'static str> {
    let folded = normalize_spaces(&fold(name));
    KNOWN_MUNICIPALITIES
        .iter()
        .copied()
        .find(|m| fold(m) == folded)
}

/// Whether a municipality belongs to the home state.
pub fn is_home_state_municipality(name: &str) -> bool {
    fold(name).contains("sao paulo") || canonical_municipality(name).is_some()
}

pub fn normalize_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uf_table() {
        assert_eq!(UFS.len(), 27);
        assert!(is_valid_uf("SP"));
        assert!(is_valid_uf("DF"));
        assert!(!is_valid_uf("XX"));
        assert!(!is_valid_uf("sp"));
    }

    #[test]
    fn test_canonical_municipality_accepts_unaccented() {
        assert_eq!(canonical_municipality("JUNDIAI"), Some("JUNDIAÍ"));
        assert_eq!(canonical_municipality("varzea   paulista"), Some("VÁRZEA PAULISTA"));
        assert_eq!(canonical_municipality("RECIFE"), None);
    }

    #[test]
    fn test_non_name_tokens() {
        assert!(is_non_name_token(" CPF "));
        assert!(is_non_name_token("FILIACAO"));
        assert!(!is_non_name_token("MARIA SOUZA"));
    }
}
