//! Shared candidate validators.
//!
//! Validators are plain predicates over a [`Hit`] or a raw value. Field
//! families compose them inside their rule closures.

use chrono::NaiveDate;

use super::Hit;
use super::patterns::DATE_SHAPE;

/// Whether the character before the hit is start of text or not in `reject`.
pub fn isolated_left(hit: &Hit<'_>, reject: &[char]) -> bool {
    hit.char_before().is_none_or(|c| !reject.contains(&c))
}

/// Whether the character after the hit is end of text or not in `reject`.
pub fn isolated_right(hit: &Hit<'_>, reject: &[char]) -> bool {
    hit.char_after().is_none_or(|c| !reject.contains(&c))
}

/// Value not part of a longer alphanumeric token on either side.
pub fn is_isolated(hit: &Hit<'_>) -> bool {
    hit.char_before().is_none_or(|c| !c.is_alphanumeric())
        && hit.char_after().is_none_or(|c| !c.is_alphanumeric())
}

/// Number not glued to a date or a longer identifier.
pub fn is_standalone_number(hit: &Hit<'_>) -> bool {
    const GLUE: [char; 3] = ['/', '.', '-'];
    isolated_left(hit, &GLUE) && isolated_right(hit, &GLUE)
}

/// Whether a value was already claimed by another field.
pub fn not_reserved(value: &str, reserved: &[&str]) -> bool {
    !reserved.iter().any(|r| *r == value)
}

/// Whether `len` characters of the trimmed value fall inside `min..=max`.
pub fn length_between(value: &str, min: usize, max: usize) -> bool {
    let len = value.trim().chars().count();
    (min..=max).contains(&len)
}

pub fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Uppercase letters (accented included) and spaces only.
pub fn is_name_charset(value: &str) -> bool {
    value.chars().any(char::is_alphabetic)
        && value
            .chars()
            .all(|c| c == ' ' || (c.is_alphabetic() && !c.is_lowercase()))
}

/// Whether the value contains something shaped like a date.
pub fn looks_like_date(value: &str) -> bool {
    DATE_SHAPE.is_match(value)
}

/// Whether the integer value falls outside the disallowed band `[from, to]`.
///
/// Values that are not numbers are never inside the band.
pub fn outside_range(value: &str, from: i64, to: i64) -> bool {
    value
        .trim()
        .parse::<i64>()
        .map(|n| !(from..=to).contains(&n))
        .unwrap_or(true)
}

pub use crate::form::fixtures::is_valid_uf;

/// Parse a `dd/mm/yyyy` date, rejecting impossible days.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%d/%m/%Y").ok()
}

pub fn digits_of(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate a CPF using its two mod-11 check digits.
///
/// Sequences of a repeated digit pass the checksum but are never issued.
pub fn validate_cpf(cpf: &str) -> bool {
    let digits: Vec<u32> = cpf.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 11 {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check = |len: usize| -> u32 {
        let sum: u32 = digits
            .iter()
            .take(len)
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 { 0 } else { rest }
    };

    check(9) == digits[9] && check(10) == digits[10]
}

/// Format a CPF as `000.000.000-00`.
pub fn format_cpf(cpf: &str) -> String {
    let digits = digits_of(cpf);

    if digits.len() != 11 {
        return cpf.to_string();
    }

    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    )
}

/// Format a CEP as `00000-000`.
pub fn format_cep(cep: &str) -> Option<String> {
    let digits = digits_of(cep);
    (digits.len() == 8).then(|| format!("{}-{}", &digits[0..5], &digits[5..8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cpf_valid() {
        assert!(validate_cpf("529.982.247-25"));
        assert!(validate_cpf("52998224725"));
        assert!(validate_cpf("111.444.777-35"));
    }

    #[test]
    fn test_validate_cpf_invalid() {
        assert!(!validate_cpf("529.982.247-24")); // Wrong check digit
        assert!(!validate_cpf("111.111.111-11")); // Repeated digit
        assert!(!validate_cpf("5299822472")); // Too short
    }

    #[test]
    fn test_format_cpf() {
        assert_eq!(format_cpf("52998224725"), "529.982.247-25");
        assert_eq!(format_cpf("529.982.247-25"), "529.982.247-25");
        assert_eq!(format_cpf("123"), "123");
    }

    #[test]
    fn test_name_charset() {
        assert!(is_name_charset("JOÃO DA SILVA"));
        assert!(!is_name_charset("João da Silva"));
        assert!(!is_name_charset("RUA 7"));
        assert!(!is_name_charset("   "));
    }

    #[test]
    fn test_standalone_number() {
        let text = "12/05 e 345";
        assert!(!is_standalone_number(&Hit::new(text, 0, 0, 2)));
        assert!(is_standalone_number(&Hit::new(text, 0, 8, 11)));
    }

    #[test]
    fn test_outside_range() {
        assert!(!outside_range("2024", 2015, 2026));
        assert!(outside_range("1563", 2015, 2026));
        assert!(outside_range("S/N", 0, 0));
    }

    #[test]
    fn test_isolated() {
        let text = "ACC B\n";
        assert!(!is_isolated(&Hit::new(text, 0, 1, 3)));
        assert!(is_isolated(&Hit::new(text, 0, 4, 5)));
    }

    #[test]
    fn test_parse_date_rejects_impossible_days() {
        assert!(parse_date("31/02/2000").is_none());
        assert_eq!(parse_date("29/02/2000"), NaiveDate::from_ymd_opt(2000, 2, 29));
    }

    #[test]
    fn test_format_cep() {
        assert_eq!(format_cep("13201005").as_deref(), Some("13201-005"));
        assert_eq!(format_cep("1320-1005"), Some("13201-005".to_string()));
        assert_eq!(format_cep("1320"), None);
    }
}
