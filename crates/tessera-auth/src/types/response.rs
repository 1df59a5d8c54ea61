//! Response types and response modes.

use std::fmt;

/// A parsed `response_type`: an unordered set of the words `code`,
/// `id_token` and `token`, or the single word `none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseType {
    code: bool,
    id_token: bool,
    token: bool,
}

impl ResponseType {
    /// Parses a space separated response type.
    ///
    /// Returns `None` for empty values, unknown or repeated words, and `none`
    /// combined with anything else.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let mut parsed = Self {
            code: false,
            id_token: false,
            token: false,
        };
        let mut none = false;
        let mut words = 0;

        for word in value.split_whitespace() {
            words += 1;
            let slot = match word {
                "code" => &mut parsed.code,
                "id_token" => &mut parsed.id_token,
                "token" => &mut parsed.token,
                "none" => &mut none,
                _ => return None,
            };
            if *slot {
                return None;
            }
            *slot = true;
        }

        match (words, none) {
            (0, _) => None,
            (1, true) => Some(parsed),
            (_, true) => None,
            _ => Some(parsed),
        }
    }

    /// `response_type=none`.
    #[must_use]
    pub fn is_none(&self) -> bool {
        !self.code && !self.id_token && !self.token
    }

    #[must_use]
    pub fn has_code(&self) -> bool {
        self.code
    }

    #[must_use]
    pub fn has_id_token(&self) -> bool {
        self.id_token
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token
    }

    /// Returns `true` if tokens are delivered through the front channel.
    #[must_use]
    pub fn issues_front_channel_tokens(&self) -> bool {
        self.id_token || self.token
    }

    /// Response mode used when the request names none.
    #[must_use]
    pub fn default_mode(&self) -> ResponseMode {
        if self.issues_front_channel_tokens() {
            ResponseMode::Fragment
        } else {
            ResponseMode::Query
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "none");
        }
        let words: Vec<&str> = [
            (self.code, "code"),
            (self.id_token, "id_token"),
            (self.token, "token"),
        ]
        .into_iter()
        .filter_map(|(set, word)| set.then_some(word))
        .collect();
        write!(f, "{}", words.join(" "))
    }
}

/// How authorization responses are delivered to the redirect URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseMode {
    /// Parameters appended to the redirect URI query.
    Query,
    /// Parameters placed in the redirect URI fragment.
    Fragment,
    /// An auto-submitting HTML form posting to the redirect URI.
    FormPost,
}

impl ResponseMode {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "query" => Some(Self::Query),
            "fragment" => Some(Self::Fragment),
            "form_post" => Some(Self::FormPost),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Fragment => "fragment",
            Self::FormPost => "form_post",
        }
    }

    /// Tokens must never travel in the query string.
    #[must_use]
    pub fn is_allowed_for(&self, response_type: &ResponseType) -> bool {
        !(matches!(self, Self::Query) && response_type.issues_front_channel_tokens())
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word_sets() {
        let a = ResponseType::parse("id_token token").unwrap();
        let b = ResponseType::parse("token  id_token").unwrap();
        assert_eq!(a, b);
        assert!(a.has_token() && a.has_id_token() && !a.has_code());
        assert_eq!(a.to_string(), "id_token token");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(ResponseType::parse("").is_none());
        assert!(ResponseType::parse("code code").is_none());
        assert!(ResponseType::parse("none code").is_none());
        assert!(ResponseType::parse("device_code").is_none());
    }

    #[test]
    fn test_none_response_type() {
        let none = ResponseType::parse("none").unwrap();
        assert!(none.is_none());
        assert_eq!(none.to_string(), "none");
        assert_eq!(none.default_mode(), ResponseMode::Query);
    }

    #[test]
    fn test_default_mode() {
        assert_eq!(
            ResponseType::parse("code").unwrap().default_mode(),
            ResponseMode::Query
        );
        assert_eq!(
            ResponseType::parse("code id_token").unwrap().default_mode(),
            ResponseMode::Fragment
        );
    }

    #[test]
    fn test_query_mode_forbidden_for_front_channel_tokens() {
        let implicit = ResponseType::parse("id_token token").unwrap();
        let code = ResponseType::parse("code").unwrap();
        assert!(!ResponseMode::Query.is_allowed_for(&implicit));
        assert!(ResponseMode::Fragment.is_allowed_for(&implicit));
        assert!(ResponseMode::FormPost.is_allowed_for(&implicit));
        assert!(ResponseMode::Query.is_allowed_for(&code));
    }
}
