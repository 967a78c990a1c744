use serde::{Deserialize, Serialize};

/// Game presentation metadata.
///
/// Everything here is optional; it feeds image tags, container names and
/// service labels but never decides whether a project can be built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    /// Short game name (e.g. `Micro Battles`).
    #[serde(default)]
    pub name: String,

    /// Display name, may contain `§` colour codes.
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub visibility: String,

    #[serde(default)]
    pub category: String,

    #[serde(default, deserialize_with = "super::deserialize_string_list")]
    pub tags: Vec<String>,
}
