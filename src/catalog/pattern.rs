//! Release-name matching.
//!
//! A ref is a release when its short name looks like `<component>@<version>`,
//! the version being one or more digits and dots (`web@1.4.2`, `api@2`).

use std::fmt;

use regex::Regex;

use super::error::{CatalogError, CatalogResult};

/// The component and version parsed from a release name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    pub component: String,
    pub version: String,
}

/// A compiled release-name pattern with two capture groups:
/// the component and the version.
#[derive(Debug, Clone)]
pub struct ReleasePattern {
    regex: Regex,
}

impl ReleasePattern {
    /// Matches `<component>@<digits and dots>` at the end of the name.
    pub const DEFAULT: &'static str = r"^(.+?)@([0-9.]+)$";

    /// Compile a custom pattern.
    pub fn new(pattern: &str) -> CatalogResult<Self> {
        let regex = Regex::new(pattern)?;
        // group 0 is the whole match
        if regex.captures_len() < 3 {
            return Err(CatalogError::MissingCaptureGroups(pattern.to_string()));
        }
        Ok(Self { regex })
    }

    /// Parse a short ref name into component and version.
    pub fn parse(&self, short_name: &str) -> Option<ReleaseVersion> {
        let captures = self.regex.captures(short_name)?;
        let component = captures.get(1)?.as_str().to_string();
        let version = captures.get(2)?.as_str().to_string();
        Some(ReleaseVersion { component, version })
    }

    /// The source text of the pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for ReleasePattern {
    fn default() -> Self {
        Self {
            regex: Regex::new(Self::DEFAULT).expect("default release pattern compiles"),
        }
    }
}

impl fmt::Display for ReleasePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.regex.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern_matches_releases() {
        let pattern = ReleasePattern::default();
        assert!(pattern.parse("v1@1.0").is_some());
        assert!(pattern.parse("web-ui@2.10.3").is_some());
        assert!(pattern.parse("api@2").is_some());
        assert!(pattern.parse("scope@pkg@1.2").is_some());
    }

    #[test]
    fn test_default_pattern_rejects_others() {
        let pattern = ReleasePattern::default();
        assert!(pattern.parse("main").is_none());
        assert!(pattern.parse("v1.0").is_none());
        assert!(pattern.parse("@1.0").is_none());
        assert!(pattern.parse("web@").is_none());
        assert!(pattern.parse("web@1.0-rc1").is_none());
        assert!(pattern.parse("web@1.0/hotfix").is_none());
    }

    #[test]
    fn test_parse_component_and_version() {
        let pattern = ReleasePattern::default();
        let parsed = pattern.parse("web-ui@2.10.3").unwrap();
        assert_eq!(parsed.component, "web-ui");
        assert_eq!(parsed.version, "2.10.3");

        // the component is non-greedy, so the version is the last @ segment
        let nested = pattern.parse("scope@pkg@1.2").unwrap();
        assert_eq!(nested.component, "scope@pkg");
        assert_eq!(nested.version, "1.2");

        assert_eq!(pattern.parse("main"), None);
    }

    #[test]
    fn test_custom_pattern() {
        let pattern = ReleasePattern::new(r"^(release)-(\d+)$").unwrap();
        assert!(pattern.parse("release-42").is_some());
        assert!(pattern.parse("v1@1.0").is_none());
        assert_eq!(pattern.parse("release-42").unwrap().version, "42");
        assert_eq!(pattern.as_str(), r"^(release)-(\d+)$");
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            ReleasePattern::new("(unclosed"),
            Err(CatalogError::InvalidPattern(_))
        ));
        assert!(matches!(
            ReleasePattern::new(r"^.+@[0-9.]+$"),
            Err(CatalogError::MissingCaptureGroups(_))
        ));
    }
}
