//! Observed slot records.
//!
//! A [`Record`] is created fresh from every fetch and never mutated. Optional
//! text fields are `None` when the resource omitted them or sent an empty
//! string; rendering supplies placeholders.

use serde::{Deserialize, Serialize};

// ============================================================================
// Schedule
// ============================================================================

/// Day/time descriptor of a slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schedule {
    /// Day label (e.g., "Monday").
    pub day: Option<String>,
    /// Time range label (e.g., "10:15-11:50").
    pub time: Option<String>,
}

impl Schedule {
    /// Creates a schedule from day and time labels.
    pub fn new(day: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            day: non_empty(day.into()),
            time: non_empty(time.into()),
        }
    }
}

// ============================================================================
// Record
// ============================================================================

/// One monitored availability unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier assigned by the resource, if it sent one.
    pub source_id: Option<String>,
    /// Display label (e.g., the sport section).
    pub category: Option<String>,
    /// When the slot takes place.
    pub schedule: Schedule,
    /// Where the slot takes place.
    pub location: Option<String>,
    /// Person running the slot.
    pub owner_name: Option<String>,
    /// Seats currently free.
    pub capacity: u32,
}

impl Record {
    /// Creates an empty record with the given capacity.
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Sets the resource-provided identifier.
    #[must_use]
    pub fn source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = non_empty(id.into());
        self
    }

    /// Sets the category label.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = non_empty(category.into());
        self
    }

    /// Sets the schedule.
    #[must_use]
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Sets the location.
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = non_empty(location.into());
        self
    }

    /// Sets the owner name.
    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner_name = non_empty(owner.into());
        self
    }

    /// Returns true if at least one seat is free.
    pub fn is_available(&self) -> bool {
        self.capacity > 0
    }
}

/// Maps empty or whitespace-only strings to `None`.
pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_drops_empty_fields() {
        let record = Record::with_capacity(2)
            .source_id("")
            .category("Swimming")
            .owner("   ");

        assert!(record.source_id.is_none());
        assert_eq!(record.category.as_deref(), Some("Swimming"));
        assert!(record.owner_name.is_none());
    }

    #[test]
    fn test_is_available() {
        assert!(Record::with_capacity(1).is_available());
        assert!(!Record::with_capacity(0).is_available());
    }
}
