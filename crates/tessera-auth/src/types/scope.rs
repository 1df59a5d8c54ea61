//! Space separated scope values.

use std::fmt;

/// An ordered, de-duplicated set of scope values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope(Vec<String>);

impl Scope {
    /// Parses a space separated scope string, keeping first occurrences.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        value.split_whitespace().collect()
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns the values of `self` that are absent from `granted`.
    #[must_use]
    pub fn missing_from(&self, granted: &Scope) -> Vec<String> {
        self.0
            .iter()
            .filter(|v| !granted.contains(v))
            .cloned()
            .collect()
    }

    /// Returns a copy without the given value.
    #[must_use]
    pub fn without(&self, value: &str) -> Self {
        Self(self.0.iter().filter(|v| *v != value).cloned().collect())
    }
}

impl<'a> FromIterator<&'a str> for Scope {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut values: Vec<String> = Vec::new();
        for value in iter {
            if !values.iter().any(|v| v == value) {
                values.push(value.to_string());
            }
        }
        Self(values)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dedups_and_keeps_order() {
        let scope = Scope::parse("openid  email openid profile");
        assert_eq!(scope.to_string(), "openid email profile");
        assert!(scope.contains("email"));
        assert!(!scope.contains("phone"));
    }

    #[test]
    fn test_missing_from() {
        let granted = Scope::parse("openid profile");
        let requested = Scope::parse("openid email phone");
        assert_eq!(requested.missing_from(&granted), vec!["email", "phone"]);
        assert!(Scope::parse("profile").missing_from(&granted).is_empty());
    }

    #[test]
    fn test_without() {
        let scope = Scope::parse("openid offline_access");
        assert_eq!(scope.without("offline_access").to_string(), "openid");
    }
}
