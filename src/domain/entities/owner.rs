//! Link ownership.

use std::fmt;

/// The principal that created a link.
///
/// Anonymous links are never listed for, or mutable by, anyone. Comparisons
/// go through [`Owner::is`] so an anonymous owner can never match a requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    Authenticated(String),
    Anonymous,
}

impl Owner {
    /// Builds an owner from the nullable `owner_id` column.
    pub fn from_column(owner_id: Option<String>) -> Self {
        match owner_id {
            Some(id) => Self::Authenticated(id),
            None => Self::Anonymous,
        }
    }

    /// Value stored in the `owner_id` column (`NULL` for anonymous).
    pub fn as_column(&self) -> Option<&str> {
        match self {
            Self::Authenticated(id) => Some(id),
            Self::Anonymous => None,
        }
    }

    /// Returns true when `requester_id` is this link's authenticated owner.
    pub fn is(&self, requester_id: &str) -> bool {
        matches!(self, Self::Authenticated(id) if id == requester_id)
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Identifier shown to API clients; anonymous owners render as `sentinel`.
    pub fn display_id<'a>(&'a self, sentinel: &'a str) -> &'a str {
        match self {
            Self::Authenticated(id) => id,
            Self::Anonymous => sentinel,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated(id) => write!(f, "user:{id}"),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}
