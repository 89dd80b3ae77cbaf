use crate::core::{RecordId, new_record_id};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An animal on the roster.
///
/// `latin_name` and `red_list_status` are derived fields kept fresh by the
/// background enrichment job; everything else is user-edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latin_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_list_status: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default)]
    pub archived: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Animal {
    pub fn new(name: impl Into<String>, species: impl Into<String>) -> Self {
        Self::with_id(new_record_id(), name, species)
    }

    pub fn with_id(id: impl Into<RecordId>, name: impl Into<String>, species: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            species: species.into(),
            latin_name: None,
            red_list_status: None,
            category: String::new(),
            location: None,
            order: None,
            archived: false,
            extra: Map::new(),
        }
    }

    pub fn order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

impl_record!(Animal => Animals in animals, ordered);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use serde_json::json;

    #[test]
    fn test_wire_names_are_camel_case() {
        let mut owl = Animal::with_id("a1", "Hoot", "Barn Owl");
        owl.latin_name = Some("Tyto alba".into());
        let value = serde_json::to_value(&owl).unwrap();
        assert_eq!(value["latinName"], "Tyto alba");
        assert!(value.get("redListStatus").is_none());
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "id": "a2",
            "name": "Kestrel",
            "species": "Common Kestrel",
            "weightGrams": 190,
            "flyingRecord": [{"distance": 1.2}]
        });
        let animal: Animal = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(animal.id(), "a2");
        assert_eq!(animal.extra["weightGrams"], 190);
        let back = serde_json::to_value(&animal).unwrap();
        assert_eq!(back["flyingRecord"], raw["flyingRecord"]);
    }

    #[test]
    fn test_sort_order_comes_from_order_field() {
        let animal = Animal::new("Pip", "Little Owl").order(3);
        assert_eq!(animal.sort_order(), Some(3));
    }
}
