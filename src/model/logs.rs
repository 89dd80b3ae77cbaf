use crate::core::{RecordId, new_record_id};
use crate::model::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteLogEntry {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub logged_by: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SiteLogEntry {
    pub fn new(title: impl Into<String>, logged_by: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            title: title.into(),
            description: String::new(),
            date: String::new(),
            logged_by: logged_by.into(),
            extra: Map::new(),
        }
    }
}

impl_record!(SiteLogEntry => SiteLogs in site_logs);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animal_id: Option<RecordId>,
    #[serde(rename = "type", default)]
    pub incident_type: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub reported_by: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Incident {
    pub fn new(incident_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            animal_id: None,
            incident_type: incident_type.into(),
            severity: String::new(),
            description: description.into(),
            date: String::new(),
            reported_by: String::new(),
            extra: Map::new(),
        }
    }
}

impl_record!(Incident => Incidents in incidents);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstAidLogEntry {
    pub id: RecordId,
    pub person_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub logged_by: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FirstAidLogEntry {
    pub fn new(person_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            person_name: person_name.into(),
            description: description.into(),
            treatment: String::new(),
            date: String::new(),
            logged_by: String::new(),
            extra: Map::new(),
        }
    }
}

impl_record!(FirstAidLogEntry => FirstAidLogs in first_aid_logs);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftStatus {
    Active,
    Completed,
}

/// One attendance shift. Open while `status` is `Active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLogEntry {
    pub id: RecordId,
    pub user_id: RecordId,
    #[serde(default)]
    pub user_name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    pub status: ShiftStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TimeLogEntry {
    /// A fresh active shift for `user` starting at `start_time`
    pub fn open(user: &User, start_time: DateTime<Utc>) -> Self {
        Self {
            id: new_record_id(),
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            start_time,
            end_time: None,
            duration_minutes: None,
            status: ShiftStatus::Active,
            extra: Map::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ShiftStatus::Active
    }

    /// The completed shape of this shift when it ends at `end_time`.
    ///
    /// Duration is whole elapsed minutes, floored. An end time before the
    /// start (clock skew between devices) yields zero.
    pub fn closed_at(&self, end_time: DateTime<Utc>) -> Self {
        let elapsed_ms = (end_time - self.start_time).num_milliseconds().max(0);
        Self {
            end_time: Some(end_time),
            duration_minutes: Some(elapsed_ms / 60_000),
            status: ShiftStatus::Completed,
            ..self.clone()
        }
    }
}

impl_record!(TimeLogEntry => TimeLogs in time_logs);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn keeper() -> User {
        User::with_id("u1", "Sam")
    }

    #[test]
    fn test_closed_at_floors_minutes() {
        let start = Utc::now();
        let shift = TimeLogEntry::open(&keeper(), start);
        let closed = shift.closed_at(start + Duration::milliseconds(125_000));
        assert_eq!(closed.duration_minutes, Some(2));
        assert_eq!(closed.status, ShiftStatus::Completed);
        assert_eq!(closed.id, shift.id);
    }

    #[test]
    fn test_closed_at_never_negative() {
        let start = Utc::now();
        let shift = TimeLogEntry::open(&keeper(), start);
        let closed = shift.closed_at(start - Duration::minutes(5));
        assert_eq!(closed.duration_minutes, Some(0));
    }

    #[test]
    fn test_status_serializes_as_variant_name() {
        let shift = TimeLogEntry::open(&keeper(), Utc::now()).closed_at(Utc::now());
        let value = serde_json::to_value(&shift).unwrap();
        assert_eq!(value["status"], "Completed");
        assert!(value.get("durationMinutes").is_some());
    }

    #[test]
    fn test_incident_type_uses_reserved_wire_name() {
        let incident = Incident::new("escape", "gate left open");
        let value = serde_json::to_value(&incident).unwrap();
        assert_eq!(value["type"], "escape");
    }
}
