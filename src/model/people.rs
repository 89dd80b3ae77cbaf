use crate::core::{RecordId, new_record_id};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Staff,
    #[default]
    Volunteer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(new_record_id(), name)
    }

    pub fn with_id(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: UserRole::default(),
            email: None,
            extra: Map::new(),
        }
    }

    pub fn role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl_record!(User => Users in users);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animal_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<RecordId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            title: title.into(),
            animal_id: None,
            due_date: None,
            completed: false,
            assigned_to: None,
            extra: Map::new(),
        }
    }
}

impl_record!(Task => Tasks in tasks);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HolidayStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayRequest {
    pub id: RecordId,
    pub user_id: RecordId,
    #[serde(default)]
    pub user_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: HolidayStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HolidayRequest {
    pub fn new(user: &User, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: new_record_id(),
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            start_date,
            end_date,
            status: HolidayStatus::Pending,
            notes: None,
            extra: Map::new(),
        }
    }

    /// Calendar days covered, inclusive of both ends
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days().max(0) + 1
    }
}

impl_record!(HolidayRequest => HolidayRequests in holiday_requests);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults_to_volunteer() {
        let user: User = serde_json::from_str(r#"{"id":"u9","name":"Ari"}"#).unwrap();
        assert_eq!(user.role, UserRole::Volunteer);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_holiday_days_inclusive() {
        let user = User::with_id("u1", "Sam");
        let start = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 8, 3).unwrap();
        assert_eq!(HolidayRequest::new(&user, start, end).days(), 3);
    }
}
