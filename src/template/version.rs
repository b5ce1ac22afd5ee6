//! API version tokens and their precedence.
//!
//! Providers version every URL independently, typically as an ISO date with an
//! optional pre-release suffix (`2021-03-01`, `2021-03-01-preview`), sometimes
//! as dotted numbers (`7.4`). Ordering compares the leading numeric release
//! components numerically, ranks a stable release above any suffixed release
//! of the same components, and falls back to plain string order so that `Ord`
//! stays consistent with `Eq`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiVersion(String);

impl ApiVersion {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_prerelease(&self) -> bool {
        self.parts().1.is_some()
    }

    /// Numeric release components plus the remaining suffix, if any.
    fn parts(&self) -> (Vec<u64>, Option<&str>) {
        let mut release = Vec::new();
        let mut rest = self.0.as_str();
        loop {
            let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits == 0 {
                break;
            }
            // Components longer than u64 are not versions we know how to rank.
            let Ok(value) = rest[..digits].parse::<u64>() else {
                break;
            };
            release.push(value);
            rest = &rest[digits..];
            match rest.strip_prefix(['-', '.']) {
                Some(next) if next.starts_with(|c: char| c.is_ascii_digit()) => rest = next,
                _ => break,
            }
        }

        let suffix = rest.trim_start_matches(['-', '.']);
        (release, (!suffix.is_empty()).then_some(suffix))
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        let (left_release, left_suffix) = self.parts();
        let (right_release, right_suffix) = other.parts();

        left_release
            .cmp(&right_release)
            .then_with(|| match (left_suffix, right_suffix) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApiVersion {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
