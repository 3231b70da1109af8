use std::{fmt, str::FromStr};

use thiserror::Error;

/// The URL namespace owned by the embedded UI, e.g. `custom/ui`. Stored without leading or
/// trailing slashes. Matching against request paths ignores ASCII case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutePrefix(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidPrefix {
    #[error("route prefix must not be empty")]
    Empty,
    #[error("route prefix '{0}' must not start or end with '/'")]
    SurroundingSlash(String),
    #[error("route prefix '{0}' contains an empty segment")]
    EmptySegment(String),
    #[error("route prefix '{prefix}' contains invalid character {character:?}")]
    InvalidCharacter { prefix: String, character: char },
}

impl RoutePrefix {
    pub fn new(prefix: impl Into<String>) -> Result<Self, InvalidPrefix> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(InvalidPrefix::Empty);
        }
        if prefix.starts_with('/') || prefix.ends_with('/') {
            return Err(InvalidPrefix::SurroundingSlash(prefix));
        }
        if prefix.split('/').any(str::is_empty) {
            return Err(InvalidPrefix::EmptySegment(prefix));
        }
        if let Some(character) = prefix
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '?' | '#' | '\\'))
        {
            return Err(InvalidPrefix::InvalidCharacter { prefix, character });
        }
        Ok(RoutePrefix(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if `path`, ignoring a single leading and a single trailing slash, is the prefix
    /// itself. E.g. `/custom/ui`, `/custom/ui/` or `/CUSTOM/UI`.
    pub fn is_exactly(&self, path: &str) -> bool {
        let path = path.strip_prefix('/').unwrap_or(path);
        let path = path.strip_suffix('/').unwrap_or(path);
        path.eq_ignore_ascii_case(&self.0)
    }

    /// Removes `/<prefix>` from the start of `path`. Returns the remainder, which is either empty
    /// or starts with `/`. `None` if the path is not within the namespace of the prefix. A path
    /// like `/custom/uiextra` is not considered to be below `custom/ui`.
    pub fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        let path = path.strip_prefix('/')?;
        let head = path.get(..self.0.len())?;
        if !head.eq_ignore_ascii_case(&self.0) {
            return None;
        }
        let rest = &path[self.0.len()..];
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }
}

impl FromStr for RoutePrefix {
    type Err = InvalidPrefix;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoutePrefix::new(s)
    }
}

impl fmt::Display for RoutePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
