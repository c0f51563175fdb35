//! Shared identifiers for host windows and documents.
#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for a host window.
///
/// Values come from the host registry. Only strictly positive values name a
/// real window; [`WindowId::NONE`] is reported by focus events when no window
/// has focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(i64);

impl WindowId {
    /// Sentinel reported when focus leaves every window.
    pub const NONE: Self = Self(-1);

    /// Wrap a raw host value.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw host value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// True when the id can name a real window.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl From<i64> for WindowId {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<WindowId> for i64 {
    fn from(value: WindowId) -> Self {
        value.get()
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for an open document (tab).
///
/// Unique only while the document stays open; the host may reuse a value
/// after the document closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(i64);

impl DocumentId {
    /// Wrap a raw host value.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw host value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// True when the id can name a real document.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl From<i64> for DocumentId {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<DocumentId> for i64 {
    fn from(value: DocumentId) -> Self {
        value.get()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
