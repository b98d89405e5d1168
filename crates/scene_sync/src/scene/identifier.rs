//! External identifiers and name matching
//!
//! External ids have the canonical form `"n" + numericId`. Several ids may
//! collapse onto one node, in which case the node name joins them with a
//! separator (`"n4;n12"`).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::SceneError;

/// Canonical external id (`n<digits>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalId(String);

impl ExternalId {
    /// Prefix shared by every external id
    pub const PREFIX: char = 'n';

    /// Build the id for a numeric id from the pose feed
    pub fn from_numeric(id: u64) -> Self {
        Self(format!("{}{}", Self::PREFIX, id))
    }

    /// Parse a canonical id
    pub fn parse(text: &str) -> Result<Self, SceneError> {
        let digits = text
            .strip_prefix(Self::PREFIX)
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));
        match digits {
            Some(_) => Ok(Self(text.to_string())),
            None => Err(SceneError::InvalidId(text.to_string())),
        }
    }

    /// The id as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for ExternalId {
    fn from(id: u64) -> Self {
        Self::from_numeric(id)
    }
}

impl FromStr for ExternalId {
    type Err = SceneError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl TryFrom<String> for ExternalId {
    type Error = SceneError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(&text)
    }
}

impl From<ExternalId> for String {
    fn from(id: ExternalId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an id is found inside a name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdMatching {
    /// The id equals one separator-delimited token of the name
    ///
    /// `"n1"` does not match a node named `"n12"`.
    #[default]
    Token,
    /// The id occurs anywhere in the name
    ///
    /// `"n1"` matches `"n12"`; first match in traversal order wins.
    Substring,
}

/// Finds external ids in node and attachment names
#[derive(Debug, Clone)]
pub struct NameMatcher {
    separator: String,
    matching: IdMatching,
}

impl NameMatcher {
    /// Create a matcher for a separator and policy
    pub fn new(separator: impl Into<String>, matching: IdMatching) -> Self {
        Self {
            separator: separator.into(),
            matching,
        }
    }

    /// Matching policy in use
    pub fn matching(&self) -> IdMatching {
        self.matching
    }

    /// Whether `name` carries `id`
    pub fn matches(&self, name: &str, id: &ExternalId) -> bool {
        match self.matching {
            IdMatching::Token => self.tokens(name).any(|token| token == id.as_str()),
            IdMatching::Substring => name.contains(id.as_str()),
        }
    }

    /// Canonical ids carried by `name`, in order
    ///
    /// Tokens that are not canonical ids are skipped.
    pub fn ids<'a>(&'a self, name: &'a str) -> impl Iterator<Item = ExternalId> + 'a {
        self.tokens(name).filter_map(|token| ExternalId::parse(token).ok())
    }

    /// Separator-delimited, trimmed, non-empty tokens of `text`
    pub fn tokens<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        text.split(self.separator.as_str())
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

impl Default for NameMatcher {
    fn default() -> Self {
        Self::new(";", IdMatching::Token)
    }
}
