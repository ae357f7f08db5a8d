//! SharePoint sites and lists

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteList {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub created_date_time: Option<DateTime<Utc>>,
}

/// A list row; column values are kept as raw JSON since lists are
/// user-defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: String,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl ListItem {
    /// Column value as text, if present and a string.
    #[must_use]
    pub fn field_str(&self, column: &str) -> Option<&str> {
        self.fields.get(column).and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_item_exposes_fields() {
        let item: ListItem = serde_json::from_str(
            r#"{"id": "1", "fields": {"Title": "Widget", "Quantity": 3}}"#,
        )
        .unwrap();

        assert_eq!(item.field_str("Title"), Some("Widget"));
        assert_eq!(item.field_str("Quantity"), None);
        assert_eq!(item.fields["Quantity"], 3);
    }
}
