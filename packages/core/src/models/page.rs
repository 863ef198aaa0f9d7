//! Page Tree Data Structures
//!
//! Pages are the nodes of a space's page tree. Each page has a store-assigned
//! integer identifier, a title, and a position among its siblings.
//!
//! # Identifiers
//!
//! Commands refer to pages through [`PageRef`], which is either:
//!
//! - a real identifier (`"42"`), assigned by the page store, or
//! - a placeholder (`"j1_3"`), assigned by the client to a page that a command
//!   earlier in the same batch is going to create.
//!
//! Anything that parses as an integer is a real identifier; every other
//! non-empty string is a placeholder, so the two never collide.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned page identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub i64);

impl PageId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Reference to a page as written by a client
///
/// Serialized as a plain string on the wire (`"42"` or `"j1_3"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PageRef {
    /// Identifier already assigned by the store
    Real(PageId),
    /// Batch-local stand-in for a page that does not exist yet
    Placeholder(String),
}

impl PageRef {
    pub fn real(id: impl Into<PageId>) -> Self {
        Self::Real(id.into())
    }

    pub fn placeholder(key: impl Into<String>) -> Self {
        Self::Placeholder(key.into())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(id) => write!(f, "{}", id),
            Self::Placeholder(key) => f.write_str(key),
        }
    }
}

/// Returned when a page reference is an empty or blank string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Page reference must not be empty")]
pub struct EmptyPageRef;

impl FromStr for PageRef {
    type Err = EmptyPageRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EmptyPageRef);
        }
        match trimmed.parse::<i64>() {
            Ok(id) => Ok(Self::Real(PageId(id))),
            Err(_) => Ok(Self::Placeholder(trimmed.to_string())),
        }
    }
}

impl TryFrom<String> for PageRef {
    type Error = EmptyPageRef;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PageRef> for String {
    fn from(value: PageRef) -> Self {
        value.to_string()
    }
}

impl From<PageId> for PageRef {
    fn from(id: PageId) -> Self {
        Self::Real(id)
    }
}

/// A page as returned by the page store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    /// Key of the space (tree root) this page belongs to
    pub space_key: String,
    /// `None` only for a space's home page
    pub parent_id: Option<PageId>,
    /// Index among the parent's children
    pub position: usize,
    pub title: String,
    /// Children in sibling order
    pub child_ids: Vec<PageId>,
}

impl Page {
    /// Location of this page, `None` for a home page
    pub fn location(&self) -> Option<Location> {
        self.parent_id.map(|parent_id| Location {
            parent_id,
            position: self.position,
        })
    }
}

/// Ordered insertion position: parent plus index among siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub parent_id: PageId,
    pub position: usize,
}

impl Location {
    pub fn new(parent_id: PageId, position: usize) -> Self {
        Self {
            parent_id,
            position,
        }
    }
}

/// Snapshot of a page taken right before a command moves or removes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalPage {
    pub page_id: PageId,
    pub title: String,
    pub original_location: Location,
}

impl OriginalPage {
    /// Capture a snapshot of `page`; `None` for a home page, which has no location
    pub fn capture(page: &Page) -> Option<Self> {
        page.location().map(|original_location| Self {
            page_id: page.id,
            title: page.title.clone(),
            original_location,
        })
    }
}
