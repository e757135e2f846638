//! Date extraction for RENACH forms.
//!
//! All dates are strict `DD/MM/YYYY` found after their label, with any text
//! in between as long as it fits the window. Each field has its own
//! plausibility band relative to a reference date.

use chrono::{Datelike, Local, NaiveDate};
use lazy_static::lazy_static;

use super::patterns::{
    DATE_VALUE, EXAME_DATE_LABEL, LAUDO_DATE_LABEL, NASCIMENTO_LABEL, PRIMEIRA_HAB_LABEL,
    PRIMEIRA_HAB_SHORT_LABEL,
};
use super::validators::parse_date;
use super::{Candidate, Rule, RuleSet};
use crate::form::DocumentText;
use crate::models::record::Field;

/// Bytes searched after a date label.
const DATE_WINDOW: usize = 120;

/// Earliest plausible first license.
const FIRST_LICENSE_YEAR: i32 = 1970;

/// Earliest plausible birth year.
const BIRTH_YEAR: i32 = 1900;

lazy_static! {
    static ref BIRTH_RULES: RuleSet = RuleSet::new(
        Field::DataNascimento,
        vec![Rule::anchored("data-nascimento", &NASCIMENTO_LABEL, &DATE_VALUE, DATE_WINDOW, 0)],
    );

    static ref EXAM_RULES: RuleSet = RuleSet::new(
        Field::DataExame,
        vec![
            Rule::anchored("data-exame", &EXAME_DATE_LABEL, &DATE_VALUE, DATE_WINDOW, 0),
            Rule::anchored("data-laudo", &LAUDO_DATE_LABEL, &DATE_VALUE, DATE_WINDOW, 1),
        ],
    );

    static ref FIRST_LICENSE_RULES: RuleSet = RuleSet::new(
        Field::DataPrimeiraHabilitacao,
        vec![
            Rule::anchored(
                "primeira-habilitacao",
                &PRIMEIRA_HAB_LABEL,
                &DATE_VALUE,
                DATE_WINDOW,
                0,
            ),
            Rule::anchored("1a-hab", &PRIMEIRA_HAB_SHORT_LABEL, &DATE_VALUE, DATE_WINDOW, 1),
        ],
    );
}

/// Date rules bound to a reference date.
#[derive(Debug, Clone, Copy)]
pub struct DateRules {
    reference: NaiveDate,
}

impl DateRules {
    pub fn new(reference: NaiveDate) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    fn year(&self) -> i32 {
        self.reference.year()
    }

    /// Date of birth, 1900 up to the reference year.
    pub fn birth(&self, doc: &DocumentText<'_>) -> Option<Candidate> {
        self.first_in_band(&BIRTH_RULES, doc, BIRTH_YEAR, self.year())
    }

    /// Exam date, no older than the year before the reference year.
    pub fn exam(&self, doc: &DocumentText<'_>) -> Option<Candidate> {
        self.first_in_band(&EXAM_RULES, doc, self.year() - 1, i32::MAX)
    }

    /// First license date, 1970 up to the reference year.
    pub fn first_license(&self, doc: &DocumentText<'_>) -> Option<Candidate> {
        self.first_in_band(&FIRST_LICENSE_RULES, doc, FIRST_LICENSE_YEAR, self.year())
    }

    fn first_in_band(
        &self,
        rules: &RuleSet,
        doc: &DocumentText<'_>,
        from: i32,
        to: i32,
    ) -> Option<Candidate> {
        rules.first(doc, |_, hit| {
            let date = parse_date(hit.value())?;
            (from..=to)
                .contains(&date.year())
                .then(|| date.format("%d/%m/%Y").to_string())
        })
    }
}

impl Default for DateRules {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}
