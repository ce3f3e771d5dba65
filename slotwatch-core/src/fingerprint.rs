//! Stable record identity and change detection.
//!
//! A [`Fingerprint`] identifies "the same slot" across polling cycles. The
//! [`KnownSet`] holds fingerprints that were already reported as available
//! and are still present in the latest fetch. [`classify`] folds one fetch
//! into the known set and returns the records that became available.

use ring::digest;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fmt::Write as _;
use tracing::debug;

use crate::models::Record;

/// Placeholder hashed in place of a missing field.
const EMPTY_FIELD: &str = "-";

/// Separator between hashed fields (ASCII unit separator).
const FIELD_SEPARATOR: &[u8] = b"\x1f";

// ============================================================================
// Fingerprint
// ============================================================================

/// Stable identity string of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derives the fingerprint of a record.
    ///
    /// The resource identifier is used verbatim when present. Otherwise the
    /// fingerprint is the hex SHA-256 of `(day, time, owner, category)`, so it
    /// does not depend on capacity, location, process, or input order.
    pub fn of(record: &Record) -> Self {
        if let Some(id) = record.source_id.as_deref().filter(|id| !id.is_empty()) {
            return Self(id.to_string());
        }

        let fields = [
            record.schedule.day.as_deref(),
            record.schedule.time.as_deref(),
            record.owner_name.as_deref(),
            record.category.as_deref(),
        ];

        let mut ctx = digest::Context::new(&digest::SHA256);
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                ctx.update(FIELD_SEPARATOR);
            }
            let value = field.filter(|v| !v.is_empty()).unwrap_or(EMPTY_FIELD);
            ctx.update(value.as_bytes());
        }

        Self(to_hex(ctx.finish().as_ref()))
    }

    /// Returns the fingerprint as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

// ============================================================================
// Known Set
// ============================================================================

/// Fingerprints already notified as available and still present.
///
/// Starts empty on every process start; nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownSet {
    inner: HashSet<Fingerprint>,
}

impl KnownSet {
    /// Creates an empty known set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the fingerprint is known.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.inner.contains(fingerprint)
    }

    /// Number of known fingerprints.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if nothing is known.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over known fingerprints in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.inner.iter()
    }
}

impl FromIterator<Fingerprint> for KnownSet {
    fn from_iter<I: IntoIterator<Item = Fingerprint>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Result of folding one fetch into the known set.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Records with free seats whose fingerprint was not known, in input order.
    pub newly_available: Vec<Record>,
    /// The known set to carry into the next cycle.
    pub known: KnownSet,
    /// Distinct fingerprints observed in this fetch.
    pub observed: usize,
    /// Previously known fingerprints dropped because they were not observed.
    pub evicted: usize,
}

/// Classifies the records of one successful fetch against the known set.
///
/// Every record counts towards the set of observed fingerprints regardless of
/// capacity. A record with free seats is newly available when its fingerprint
/// is not yet known; it then becomes known. A full record is never reported
/// and never added, but keeps an existing entry alive. Finally, anything not
/// observed in this fetch is evicted, so an empty fetch clears the set.
///
/// Failed fetches must not be passed here.
pub fn classify<I>(records: I, known: KnownSet) -> Classification
where
    I: IntoIterator<Item = Record>,
{
    let mut running = known.inner;
    let mut observed: HashSet<Fingerprint> = HashSet::new();
    let mut newly_available = Vec::new();

    for record in records {
        let fingerprint = Fingerprint::of(&record);
        observed.insert(fingerprint.clone());

        if record.is_available() && running.insert(fingerprint) {
            newly_available.push(record);
        }
    }

    let before = running.len();
    running.retain(|fp| observed.contains(fp));
    let evicted = before - running.len();

    debug!(
        observed = observed.len(),
        new = newly_available.len(),
        evicted = evicted,
        known = running.len(),
        "Classified fetch"
    );

    Classification {
        newly_available,
        known: KnownSet { inner: running },
        observed: observed.len(),
        evicted,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Schedule;

    fn unnamed(capacity: u32) -> Record {
        Record::with_capacity(capacity)
            .category("Volleyball")
            .schedule(Schedule::new("Tuesday", "12:00-13:35"))
            .owner("Petrov A. V.")
            .location("Hall 2")
    }

    #[test]
    fn test_source_id_is_used_verbatim() {
        let record = Record::with_capacity(3).source_id("42-abc");
        assert_eq!(Fingerprint::of(&record).as_str(), "42-abc");
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let record = unnamed(1);
        assert_eq!(Fingerprint::of(&record), Fingerprint::of(&record));
        assert_eq!(Fingerprint::of(&record), Fingerprint::of(&record.clone()));
    }

    #[test]
    fn test_fingerprint_ignores_capacity_and_location() {
        let mut other = unnamed(0);
        other.location = Some("Pool".to_string());
        assert_eq!(Fingerprint::of(&unnamed(5)), Fingerprint::of(&other));
    }

    #[test]
    fn test_fingerprint_distinguishes_slots() {
        let a = unnamed(1);
        let b = unnamed(1).schedule(Schedule::new("Tuesday", "13:50-15:25"));
        let c = unnamed(1).owner("Sidorova E. N.");
        let d = unnamed(1).category("Basketball");

        let prints: HashSet<_> = [&a, &b, &c, &d].iter().map(|r| Fingerprint::of(r)).collect();
        assert_eq!(prints.len(), 4);
    }

    #[test]
    fn test_fallback_hash_is_stable_across_releases() {
        // Pinned value: changing the derivation would re-notify every slot.
        let record = Record::with_capacity(1);
        let expected = {
            let mut ctx = digest::Context::new(&digest::SHA256);
            ctx.update(b"-\x1f-\x1f-\x1f-");
            to_hex(ctx.finish().as_ref())
        };
        assert_eq!(Fingerprint::of(&record).as_str(), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn test_field_boundaries_matter() {
        let a = Record::with_capacity(1).schedule(Schedule::new("ab", "c"));
        let b = Record::with_capacity(1).schedule(Schedule::new("a", "bc"));
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_classify_empty_input_evicts_everything() {
        let known: KnownSet = ["a", "b"].into_iter().map(Fingerprint::from).collect();
        let result = classify(Vec::new(), known);

        assert!(result.newly_available.is_empty());
        assert!(result.known.is_empty());
        assert_eq!(result.evicted, 2);
    }

    #[test]
    fn test_full_record_is_observed_but_not_added() {
        let record = Record::with_capacity(0).source_id("A");
        let result = classify(vec![record], KnownSet::new());

        assert!(result.newly_available.is_empty());
        assert!(result.known.is_empty());
        assert_eq!(result.observed, 1);
    }

    #[test]
    fn test_full_record_keeps_known_entry() {
        let known: KnownSet = std::iter::once(Fingerprint::from("A")).collect();
        let result = classify(vec![Record::with_capacity(0).source_id("A")], known);

        assert!(result.known.contains(&Fingerprint::from("A")));
        assert_eq!(result.evicted, 0);
    }

    #[test]
    fn test_duplicate_records_in_one_fetch_report_once() {
        let records = vec![
            Record::with_capacity(2).source_id("A"),
            Record::with_capacity(1).source_id("A"),
        ];
        let result = classify(records, KnownSet::new());
        assert_eq!(result.newly_available.len(), 1);
        assert_eq!(result.newly_available[0].capacity, 2);
    }

    #[test]
    fn test_new_records_keep_input_order() {
        let records = vec![
            Record::with_capacity(1).source_id("c"),
            Record::with_capacity(1).source_id("a"),
            Record::with_capacity(1).source_id("b"),
        ];
        let ids: Vec<_> = classify(records, KnownSet::new())
            .newly_available
            .into_iter()
            .filter_map(|r| r.source_id)
            .collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }
}
