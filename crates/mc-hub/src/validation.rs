//! Write-side checks for person records.

use mc_core::Record;
use regex::Regex;
use std::sync::OnceLock;

/// Fields a new member must carry.
pub const CREATE_REQUIRED: &[&str] = &["first_name", "last_name", "affiliation", "role", "email"];

/// Fields an edited member must carry.
pub const EDIT_REQUIRED: &[&str] = &[
    "_id",
    "first_name",
    "last_name",
    "affiliation",
    "role",
    "email",
    "full_name",
];

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// Every `required` field present and non-blank, `email` well formed.
pub fn validate_person(record: &Record, required: &[&str]) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for field in required {
        let present = record
            .text(field)
            .is_some_and(|text| !text.trim().is_empty());
        if !present {
            errors.push(format!("{} is required", field));
        }
    }

    if let Some(email) = record.text("email") {
        if !email.trim().is_empty() && !email_pattern().is_match(&email) {
            errors.push("email must be a valid email address".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> Record {
        Record::from([
            ("first_name", "Keala"),
            ("last_name", "Kahale"),
            ("affiliation", "UH Manoa"),
            ("role", "student"),
            ("email", "keala@hawaii.edu"),
        ])
    }

    #[test]
    fn test_complete_member_passes() {
        assert!(validate_person(&member(), CREATE_REQUIRED).is_ok());
    }

    #[test]
    fn test_missing_and_blank_fields_are_listed() {
        let mut r = member();
        r.remove("role");
        r.insert("affiliation", "  ");
        let errors = validate_person(&r, CREATE_REQUIRED).unwrap_err();
        assert_eq!(errors, vec!["affiliation is required", "role is required"]);
    }

    #[test]
    fn test_bad_email_is_rejected() {
        let mut r = member();
        r.insert("email", "keala.hawaii.edu");
        let errors = validate_person(&r, CREATE_REQUIRED).unwrap_err();
        assert_eq!(errors, vec!["email must be a valid email address"]);
    }

    #[test]
    fn test_edit_requires_id_and_full_name() {
        let errors = validate_person(&member(), EDIT_REQUIRED).unwrap_err();
        assert_eq!(errors, vec!["_id is required", "full_name is required"]);
    }
}
