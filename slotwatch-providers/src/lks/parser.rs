//! Schedule payload parser.
//!
//! Payload shape: `[{ "groups": [ { ...slot fields... } ] }]`.
//!
//! The outer structure is strict: anything other than a list of objects is a
//! malformed payload. Slot fields are lenient: text fields accept strings or
//! numbers and fall back to `None`; `vacancy` accepts a number or numeric
//! string and falls back to 0.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use slotwatch_core::{CoreError, Record, Schedule};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct DayEntry {
    #[serde(default)]
    groups: Option<Vec<GroupEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    section: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    week: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    place: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    teacher_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_capacity")]
    vacancy: u32,
}

impl From<GroupEntry> for Record {
    fn from(group: GroupEntry) -> Self {
        Record {
            source_id: group.id,
            category: group.section,
            schedule: Schedule {
                day: group.week,
                time: group.time,
            },
            location: group.place,
            owner_name: group.teacher_name,
            capacity: group.vacancy,
        }
    }
}

/// Parses a schedule response body into records, in payload order.
pub fn parse_schedule(body: &str) -> Result<Vec<Record>, CoreError> {
    debug!(len = body.len(), "Parsing schedule");

    let days: Vec<DayEntry> = serde_json::from_str(body)
        .map_err(|e| CoreError::MalformedPayload(format!("schedule: {e}")))?;

    let records: Vec<Record> = days
        .into_iter()
        .flat_map(|day| day.groups.unwrap_or_default())
        .map(Record::from)
        .collect();

    debug!(records = records.len(), "Schedule parsed");
    Ok(records)
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_capacity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .map_or(0, clamp_u32),
        Value::String(s) => s.trim().parse::<u64>().map_or(0, clamp_u32),
        _ => 0,
    })
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schedule() {
        let json = r#"[
            {"groups": [
                {"id": "g-1", "section": "Swimming", "week": "Monday", "time": "10:15-11:50",
                 "place": "Pool", "teacherName": "Orlova T. V.", "vacancy": 3},
                {"id": "g-2", "section": "Chess", "week": "Monday", "time": "12:00-13:35",
                 "vacancy": 0}
            ]},
            {"groups": [
                {"section": "Boxing", "week": "Thursday", "time": "15:40-17:15",
                 "teacherUid": "u-77", "teacherName": "Kim D.", "vacancy": "2"}
            ]}
        ]"#;

        let records = parse_schedule(json).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].source_id.as_deref(), Some("g-1"));
        assert_eq!(records[0].category.as_deref(), Some("Swimming"));
        assert_eq!(records[0].schedule.day.as_deref(), Some("Monday"));
        assert_eq!(records[0].location.as_deref(), Some("Pool"));
        assert_eq!(records[0].owner_name.as_deref(), Some("Orlova T. V."));
        assert_eq!(records[0].capacity, 3);

        assert_eq!(records[1].capacity, 0);
        assert!(records[1].location.is_none());

        assert!(records[2].source_id.is_none());
        assert_eq!(records[2].capacity, 2);
    }

    #[test]
    fn test_empty_list_is_valid() {
        assert!(parse_schedule("[]").unwrap().is_empty());
    }
}
