//! URL scheme of a hop.

use std::fmt;

/// Scheme used to reach a hop (or served by a listener).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    /// Plain HTTP
    #[default]
    Http,
    /// HTTP over TLS
    Https,
}

impl Scheme {
    /// Get scheme name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// Parse a scheme marker as it appears in a path segment (`http:` / `https:`).
    pub fn from_segment(segment: &str) -> Option<Self> {
        let name = segment.strip_suffix(':')?;
        if name.eq_ignore_ascii_case("http") {
            Some(Scheme::Http)
        } else if name.eq_ignore_ascii_case("https") {
            Some(Scheme::Https)
        } else {
            None
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_http() {
        assert_eq!(Scheme::default(), Scheme::Http);
    }

    #[test]
    fn test_from_segment() {
        assert_eq!(Scheme::from_segment("http:"), Some(Scheme::Http));
        assert_eq!(Scheme::from_segment("https:"), Some(Scheme::Https));
        assert_eq!(Scheme::from_segment("HTTPS:"), Some(Scheme::Https));
        assert_eq!(Scheme::from_segment("https"), None);
        assert_eq!(Scheme::from_segment("svc:"), None);
        assert_eq!(Scheme::from_segment("svc:8080"), None);
    }
}
