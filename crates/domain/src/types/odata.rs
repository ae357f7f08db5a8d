//! OData collection envelope

use serde::{Deserialize, Serialize};

/// One page of a Graph collection response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ODataCollection<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    #[serde(rename = "@odata.deltaLink", default, skip_serializing_if = "Option::is_none")]
    pub delta_link: Option<String>,
}

impl<T> Default for ODataCollection<T> {
    fn default() -> Self {
        Self { value: Vec::new(), next_link: None, delta_link: None }
    }
}
