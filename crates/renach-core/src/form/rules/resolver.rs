//! Priority resolution between candidates of the same field.

use tracing::debug;

use super::Candidate;

/// Pick the candidate with the lowest priority value.
///
/// Ties go to the candidate produced first.
pub fn resolve(candidates: Vec<Candidate>) -> Option<Candidate> {
    let count = candidates.len();
    let winner = candidates.into_iter().min_by_key(|c| c.priority)?;
    if count > 1 {
        debug!(
            "{}: {} candidates, kept {:?} from {}",
            winner.field, count, winner.value, winner.source
        );
    }
    Some(winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::Field;

    #[test]
    fn test_lowest_priority_wins() {
        let winner = resolve(vec![
            Candidate::new(Field::Categoria, "B", "categoria-atual", 3),
            Candidate::new(Field::Categoria, "AB", "categoria-pretendida", 0),
        ])
        .unwrap();
        assert_eq!(winner.value, "AB");
    }

    #[test]
    fn test_tie_keeps_first() {
        let winner = resolve(vec![
            Candidate::new(Field::Categoria, "A", "first", 1),
            Candidate::new(Field::Categoria, "B", "second", 1),
        ])
        .unwrap();
        assert_eq!(winner.source, "first");
    }

    #[test]
    fn test_empty() {
        assert!(resolve(Vec::new()).is_none());
    }
}
