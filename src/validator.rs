//! Member name validation and unique-name generation.

use std::collections::HashSet;

pub const MAX_NAME_LENGTH: usize = 100;

const INVALID_NAME_CHARACTERS: &str = "\"',/.:|&!~\n\r\t@#(){}[]=;^%$`";
const RESERVED_NAMES: [&str; 2] = ["None", "self"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameValidity {
    Ok,
    Empty,
    AlreadyInUse,
    InvalidCharacters,
    TooLong,
    Reserved,
}

/// Checks candidate member names against a set of taken names.
///
/// Names compare case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct NameValidator {
    taken: HashSet<String>,
}

impl NameValidator {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut validator = Self::default();
        for name in names {
            validator.reserve(name.as_ref());
        }
        validator
    }

    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_lowercase());
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(&name.to_lowercase())
    }

    pub fn validate(&self, name: &str) -> NameValidity {
        if name.is_empty() {
            NameValidity::Empty
        } else if name.chars().count() > MAX_NAME_LENGTH {
            NameValidity::TooLong
        } else if name.chars().any(|c| INVALID_NAME_CHARACTERS.contains(c)) {
            NameValidity::InvalidCharacters
        } else if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(name)) {
            NameValidity::Reserved
        } else if self.is_taken(name) {
            NameValidity::AlreadyInUse
        } else {
            NameValidity::Ok
        }
    }

    /// First free name of the form `base_N`, counting from 1.
    pub fn make_unique(&self, base: &str) -> String {
        let base = sanitize(base);
        if self.validate(&base) == NameValidity::Ok {
            return base;
        }
        let mut suffix = 1usize;
        loop {
            let candidate = format!("{}_{}", base, suffix);
            if self.validate(&candidate) == NameValidity::Ok {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Replaces invalid characters with `_` and clamps the length, leaving room for a suffix.
pub fn sanitize(name: &str) -> String {
    let mut clean: String = name
        .chars()
        .map(|c| if INVALID_NAME_CHARACTERS.contains(c) { '_' } else { c })
        .collect();
    if clean.is_empty() {
        clean.push_str("Var");
    }
    if clean.chars().count() > MAX_NAME_LENGTH - 8 {
        clean = clean.chars().take(MAX_NAME_LENGTH - 8).collect();
    }
    clean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let validator = NameValidator::new(["Health", "ReceiveTick"]);
        assert_eq!(validator.validate("Speed"), NameValidity::Ok);
        assert_eq!(validator.validate("health"), NameValidity::AlreadyInUse);
        assert_eq!(validator.validate("Bad.Name"), NameValidity::InvalidCharacters);
        assert_eq!(validator.validate("None"), NameValidity::Reserved);
        assert_eq!(validator.validate(""), NameValidity::Empty);
        assert_eq!(validator.validate(&"x".repeat(101)), NameValidity::TooLong);
    }

    #[test]
    fn test_unique_suffix_starts_at_one() {
        let mut validator = NameValidator::new(["Speed"]);
        assert_eq!(validator.make_unique("Speed"), "Speed_1");
        validator.reserve("Speed_1");
        assert_eq!(validator.make_unique("Speed"), "Speed_2");
        assert_eq!(validator.make_unique("Fresh"), "Fresh");
    }

    #[test]
    fn test_unique_name_is_deterministic() {
        let validator = NameValidator::new(["A", "A_1", "A_2"]);
        assert_eq!(validator.make_unique("A"), validator.make_unique("A"));
        assert_eq!(validator.make_unique("A"), "A_3");
    }
}
