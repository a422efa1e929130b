//! Catalogue titles and their copy counters.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors for title data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TitleValidationError {
    /// The title name was blank.
    #[error("title name must not be empty")]
    EmptyName,
    /// Available copies exceed the total.
    #[error("available copies ({available}) exceed total copies ({total})")]
    AvailableExceedsTotal {
        /// Total copies owned.
        total: u32,
        /// Copies on the shelf.
        available: u32,
    },
    /// A stored counter was negative or too large.
    #[error("copy count out of range: {0}")]
    CountOutOfRange(i64),
}

/// Stable title identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleId(Uuid);

impl TitleId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Total and available copy counters for one title.
///
/// ## Invariants
/// - `available <= total`.
///
/// # Examples
/// ```
/// use schoollib::domain::CopyCounts;
///
/// let counts = CopyCounts::new(3, 1).unwrap();
/// assert_eq!(counts.on_loan(), 2);
/// assert!(CopyCounts::new(1, 2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyCounts {
    total: u32,
    available: u32,
}

impl CopyCounts {
    /// Validate a counter pair.
    pub fn new(total: u32, available: u32) -> Result<Self, TitleValidationError> {
        if available > total {
            return Err(TitleValidationError::AvailableExceedsTotal { total, available });
        }
        Ok(Self { total, available })
    }

    /// Counters for a freshly catalogued title: every copy is on the shelf.
    pub const fn fully_available(total: u32) -> Self {
        Self {
            total,
            available: total,
        }
    }

    /// Build counters from database integers.
    pub fn from_stored(total: i32, available: i32) -> Result<Self, TitleValidationError> {
        let total = u32::try_from(total)
            .map_err(|_| TitleValidationError::CountOutOfRange(i64::from(total)))?;
        let available = u32::try_from(available)
            .map_err(|_| TitleValidationError::CountOutOfRange(i64::from(available)))?;
        Self::new(total, available)
    }

    /// Copies owned by the library.
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Copies currently on the shelf.
    pub const fn available(&self) -> u32 {
        self.available
    }

    /// Copies currently lent out.
    pub const fn on_loan(&self) -> u32 {
        self.total - self.available
    }

    /// Apply a catalogue edit of the total.
    ///
    /// Availability shifts by the raw delta between the new and old totals
    /// and is clamped into `[0, new_total]`. Storage adapters must evaluate
    /// the same arithmetic inside a single conditional write.
    #[must_use]
    pub fn adjust_total(self, new_total: u32) -> Self {
        let delta = i64::from(new_total) - i64::from(self.total);
        let shifted = (i64::from(self.available) + delta).clamp(0, i64::from(new_total));
        Self {
            total: new_total,
            available: u32::try_from(shifted).unwrap_or(new_total),
        }
    }

    /// Take one copy off the shelf, if any remain.
    #[must_use]
    pub fn decremented(self) -> Option<Self> {
        self.available.checked_sub(1).map(|available| Self {
            total: self.total,
            available,
        })
    }

    /// Put one copy back, never exceeding the total.
    #[must_use]
    pub fn incremented(self) -> Self {
        Self {
            total: self.total,
            available: self.available.saturating_add(1).min(self.total),
        }
    }
}

/// Descriptive metadata of a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleDetails {
    name: String,
    author: Option<String>,
    publisher: Option<String>,
    isbn: Option<String>,
    category: Option<String>,
}

/// Raw input for [`TitleDetails::new`].
#[derive(Debug, Clone, Default)]
pub struct TitleDetailsDraft {
    /// Display name; required.
    pub name: String,
    /// Author, if known.
    pub author: Option<String>,
    /// Publisher, if known.
    pub publisher: Option<String>,
    /// ISBN or local identifier code.
    pub isbn: Option<String>,
    /// Shelf category.
    pub category: Option<String>,
}

fn normalise(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

impl TitleDetails {
    /// Validate and normalise metadata. Blank optional fields become `None`.
    pub fn new(draft: TitleDetailsDraft) -> Result<Self, TitleValidationError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(TitleValidationError::EmptyName);
        }
        Ok(Self {
            name: name.to_owned(),
            author: normalise(draft.author),
            publisher: normalise(draft.publisher),
            isbn: normalise(draft.isbn),
            category: normalise(draft.category),
        })
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Author.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Publisher.
    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    /// ISBN or local identifier code.
    pub fn isbn(&self) -> Option<&str> {
        self.isbn.as_deref()
    }

    /// Shelf category.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// A catalogued book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    id: TitleId,
    #[serde(flatten)]
    details: TitleDetails,
    copies: CopyCounts,
}

impl Title {
    /// Assemble a title from validated parts.
    pub fn new(id: TitleId, details: TitleDetails, copies: CopyCounts) -> Self {
        Self {
            id,
            details,
            copies,
        }
    }

    /// Identifier.
    pub fn id(&self) -> TitleId {
        self.id
    }

    /// Metadata.
    pub fn details(&self) -> &TitleDetails {
        &self.details
    }

    /// Copy counters.
    pub fn copies(&self) -> CopyCounts {
        self.copies
    }
}
