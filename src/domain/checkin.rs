//! Self check-in by the last three digits of a phone number.

use crate::errors::RosterError;
use crate::models::{Member, Tour};

/// Length of a check-in code.
pub const CHECK_IN_CODE_LEN: usize = 3;

/// Validate a check-in code: exactly three ASCII digits.
pub fn validate_check_in_code(code: &str) -> Result<&str, RosterError> {
    let code = code.trim();
    if code.len() != CHECK_IN_CODE_LEN || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(RosterError::Validation(
            "Enter the last 3 digits of your phone number".to_string(),
        ));
    }
    Ok(code)
}

/// Result of matching a code against a tour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInMatch<'a> {
    /// Member to board
    Pending(&'a Member),
    /// Every matching member is already aboard; the first one is reported
    AlreadyBoarded(&'a Member),
}

/// Find the member a code refers to.
///
/// Members are scanned in list order. When several phones share the suffix, the
/// first one not yet boarded wins.
pub fn match_check_in<'a>(tour: &'a Tour, code: &str) -> Result<CheckInMatch<'a>, RosterError> {
    let code = validate_check_in_code(code)?;

    let mut candidates = tour
        .members
        .iter()
        .filter(|m| !m.phone.is_empty() && m.phone.ends_with(code))
        .peekable();

    let Some(first) = candidates.peek().copied() else {
        return Err(RosterError::NotFound(
            "No passenger matches those digits, please ask your tour leader".to_string(),
        ));
    };

    match candidates.find(|m| !tour.is_boarded(&m.id)) {
        Some(member) => Ok(CheckInMatch::Pending(member)),
        None => Ok(CheckInMatch::AlreadyBoarded(first)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tour(members: &[(&str, &str)], boarded: &[&str]) -> Tour {
        Tour {
            bus_name: "A".into(),
            members: members
                .iter()
                .map(|(id, phone)| Member::new(*id, id.to_uppercase(), phone))
                .collect(),
            boarded_ids: boarded.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_code_must_be_three_digits() {
        for code in ["", "12", "1234", "12a", "一二三"] {
            assert!(matches!(
                validate_check_in_code(code),
                Err(RosterError::Validation(_))
            ));
        }
        assert_eq!(validate_check_in_code(" 678 ").unwrap(), "678");
    }

    #[test]
    fn test_match_by_suffix() {
        let tour = tour(&[("m1", "0912345678")], &[]);
        assert_eq!(
            match_check_in(&tour, "678").unwrap(),
            CheckInMatch::Pending(&tour.members[0])
        );
    }

    #[test]
    fn test_no_match_is_not_found() {
        let tour = tour(&[("m1", "0912345678")], &[]);
        assert!(matches!(
            match_check_in(&tour, "999"),
            Err(RosterError::NotFound(_))
        ));
    }

    #[test]
    fn test_members_without_phone_never_match() {
        let tour = tour(&[("m1", "")], &[]);
        assert!(match_check_in(&tour, "000").is_err());
    }

    #[test]
    fn test_already_boarded() {
        let tour = tour(&[("m1", "0912345678")], &["m1"]);
        assert_eq!(
            match_check_in(&tour, "678").unwrap(),
            CheckInMatch::AlreadyBoarded(&tour.members[0])
        );
    }

    #[test]
    fn test_shared_suffix_prefers_first_unboarded() {
        let tour = tour(&[("m1", "0911000678"), ("m2", "0922000678")], &["m1"]);
        assert_eq!(
            match_check_in(&tour, "678").unwrap(),
            CheckInMatch::Pending(&tour.members[1])
        );

        let fresh = self::tour(&[("m1", "0911000678"), ("m2", "0922000678")], &[]);
        assert_eq!(
            match_check_in(&fresh, "678").unwrap(),
            CheckInMatch::Pending(&fresh.members[0])
        );
    }
}
