// House-number range and parity evaluation
use crate::model::{ParityRule, StreetSegment};

impl ParityRule {
    /// Whether a house number satisfies this rule
    #[inline]
    pub fn accepts(&self, house_number: i64) -> bool {
        match self {
            ParityRule::All => true,
            ParityRule::Even => house_number.rem_euclid(2) == 0,
            ParityRule::Odd => house_number.rem_euclid(2) == 1,
        }
    }
}

/// Whether `house_number` lies in the segment's inclusive range and satisfies
/// its parity rule.
#[inline]
pub fn matches(segment: &StreetSegment, house_number: i64) -> bool {
    (segment.start_number..=segment.end_number).contains(&house_number)
        && segment.parity.accepts(house_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn segment(start: i64, end: i64, parity: ParityRule) -> StreetSegment {
        let now = Utc::now();
        StreetSegment {
            id: 1,
            street_name: "RUA A".to_string(),
            original_street_name: "Rua A".to_string(),
            street_type: "RUA".to_string(),
            neighborhood: "CENTRO".to_string(),
            city: "SAO PAULO".to_string(),
            state: "SP".to_string(),
            start_number: start,
            end_number: end,
            postal_prefix: String::new(),
            parity,
            team_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_even_segment() {
        let s = segment(100, 200, ParityRule::Even);
        assert!(matches(&s, 150));
        assert!(!matches(&s, 151));
        assert!(!matches(&s, 99));
        assert!(!matches(&s, 202));
    }

    #[test]
    fn test_odd_segment() {
        let s = segment(1, 99, ParityRule::Odd);
        assert!(matches(&s, 1));
        assert!(matches(&s, 99));
        assert!(!matches(&s, 50));
    }

    #[test]
    fn test_bounds_inclusive() {
        let s = segment(100, 200, ParityRule::All);
        assert!(matches(&s, 100));
        assert!(matches(&s, 200));
        assert!(!matches(&s, 201));
    }

    #[test]
    fn test_single_number_segment() {
        let s = segment(42, 42, ParityRule::Even);
        assert!(matches(&s, 42));
        assert!(!matches(&s, 43));
    }

    #[test]
    fn test_negative_numbers_parity() {
        assert!(ParityRule::Odd.accepts(-3));
        assert!(ParityRule::Even.accepts(-4));
        assert!(!ParityRule::Even.accepts(-3));
    }
}
