use serde::{Deserialize, Deserializer, Serialize};

/// The `dependencies` section of the declaration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Dependencies {
    /// Catalog keys of the plugin libraries to bundle (e.g. `PROTOCOLLIB`).
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub libraries: Vec<String>,
}

/// Accepts a list of strings; any other shape (scalar, map, null) becomes empty.
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;

    let items = match value {
        serde_yaml::Value::Sequence(seq) => seq
            .into_iter()
            .filter_map(|item| match item {
                serde_yaml::Value::String(s) => Some(s),
                serde_yaml::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(items)
}
