//! Reference data curated by an administrator and replaced as whole lists.

use crate::core::{RecordId, new_record_id};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodOption {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FoodOption {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            name: name.into(),
            category: category.into(),
            order: None,
            extra: Map::new(),
        }
    }
}

impl_record!(FoodOption => FoodOptions in food_options, ordered);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMethod {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            name: name.into(),
            order: None,
            extra: Map::new(),
        }
    }
}

impl_record!(FeedMethod => FeedMethods in feed_methods, ordered);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Location {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            name: name.into(),
            order: None,
            extra: Map::new(),
        }
    }
}

impl_record!(Location => Locations in locations, ordered);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Contact {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            name: name.into(),
            role: role.into(),
            phone: None,
            email: None,
            extra: Map::new(),
        }
    }
}

impl_record!(Contact => Contacts in contacts);

/// Organisation details. The collection holds at most one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgProfile {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OrgProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            name: name.into(),
            address: None,
            phone: None,
            email: None,
            logo_url: None,
            extra: Map::new(),
        }
    }
}

impl_record!(OrgProfile => OrgProfile in org_profile);
