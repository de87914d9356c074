use serde::Serialize;
use std::collections::HashMap;

use super::wizard::Wizard;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub owner: Option<Wizard>,
}

/// Client-editable artifact fields, used for both creation and update.
#[derive(Debug, Clone)]
pub struct ArtifactInput {
    pub name: String,
    pub description: String,
    pub image_url: String,
}

/// Conjunctive search filter. `None` fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactCriteria {
    /// Exact id match
    pub id: Option<String>,
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    /// Case-insensitive substring of the description
    pub description: Option<String>,
    /// Case-insensitive exact owner name
    pub owner_name: Option<String>,
}

impl ArtifactCriteria {
    /// Builds criteria from a loose key/value map. Unknown keys and blank
    /// values are ignored.
    #[must_use]
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let pick = |key: &str| {
            map.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            id: pick("id"),
            name: pick("name"),
            description: pick("description"),
            owner_name: pick("ownerName"),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.owner_name.is_none()
    }
}
