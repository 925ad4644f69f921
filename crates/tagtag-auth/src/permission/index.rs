//! Access-code index.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Set of opaque permission codes.
///
/// Queries are exact string membership. Codes such as `iam:user:*` are not
/// patterns; they only match the identical string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessCodeSet {
    codes: HashSet<String>,
}

impl AccessCodeSet {
    /// Builds the index from the server's code list. Blank codes are skipped.
    pub fn build<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes
                .into_iter()
                .map(Into::into)
                .filter(|code| !code.trim().is_empty())
                .collect(),
        }
    }

    /// Whether `code` was granted.
    pub fn can(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    /// Whether any of `codes` was granted.
    pub fn can_any<'a>(&self, codes: impl IntoIterator<Item = &'a str>) -> bool {
        codes.into_iter().any(|code| self.can(code))
    }

    /// Whether all of `codes` were granted. Vacuously true for no codes.
    pub fn can_all<'a>(&self, codes: impl IntoIterator<Item = &'a str>) -> bool {
        codes.into_iter().all(|code| self.can(code))
    }

    /// Number of codes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether no codes were granted.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Codes in sorted order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.codes.iter().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl<S: Into<String>> FromIterator<S> for AccessCodeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::build(iter)
    }
}
