pub mod types;
pub use types::*;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Relative location of the declaration file inside a project root.
pub const PROPERTIES_FILE: &str = "config/game-properties.yaml";

/// The per-project declaration file (`config/game-properties.yaml`).
///
/// Only the keys Shipyard consumes are modelled; anything else in the
/// document is ignored so projects can carry their own metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GameProperties {
    /// Stable identifier of the project in the upstream platform.
    #[serde(default)]
    pub project_id: String,

    /// Namespace the project is published under.
    #[serde(default)]
    pub namespace_id: String,

    /// Game presentation metadata.
    #[serde(default)]
    pub game: GameInfo,

    /// Plugin libraries the server needs at runtime.
    #[serde(default)]
    pub dependencies: Dependencies,

    /// Environment variable names whose values are supplied at deploy time.
    #[serde(default, deserialize_with = "types::deserialize_string_list")]
    pub secret_environment_variable_keys: Vec<String>,
}

impl GameProperties {
    /// Parses a declaration document from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document is valid YAML (null); treat it as all defaults.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse game properties YAML")
    }

    /// Reads and parses the declaration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read game properties: {:?}", path))?;
        Self::from_yaml(&content)
    }

    /// Dependency keys in declaration order.
    pub fn libraries(&self) -> &[String] {
        &self.dependencies.libraries
    }

    /// Name used for display and container naming, falling back to `fallback`.
    pub fn game_name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.game.name.is_empty() {
            fallback
        } else {
            &self.game.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
projectId: arena-42
namespaceId: minigames
game:
  name: Micro Battles
  displayName: "§6Micro §eBattles"
  visibility: PUBLIC
  category: PVP
  tags: [fast, teams]
dependencies:
  libraries:
    - PROTOCOLLIB
    - DECENTHOLOGRAMS
secretEnvironmentVariableKeys:
  - API_TOKEN
"#;

    #[test]
    fn parses_full_document() {
        let props = GameProperties::from_yaml(SAMPLE).unwrap();

        assert_eq!(props.project_id, "arena-42");
        assert_eq!(props.namespace_id, "minigames");
        assert_eq!(props.game.name, "Micro Battles");
        assert_eq!(props.game.tags, vec!["fast", "teams"]);
        assert_eq!(props.libraries(), ["PROTOCOLLIB", "DECENTHOLOGRAMS"]);
        assert_eq!(props.secret_environment_variable_keys, vec!["API_TOKEN"]);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let props = GameProperties::from_yaml("projectId: solo\n").unwrap();

        assert_eq!(props.project_id, "solo");
        assert!(props.libraries().is_empty());
        assert!(props.secret_environment_variable_keys.is_empty());
        assert_eq!(props.game_name_or("dir-name"), "dir-name");
    }

    #[test]
    fn non_list_libraries_are_ignored() {
        let props =
            GameProperties::from_yaml("dependencies:\n  libraries: PROTOCOLLIB\n").unwrap();
        assert!(props.libraries().is_empty());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(GameProperties::from_yaml("").unwrap(), GameProperties::default());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(GameProperties::from_yaml("projectId: [unclosed").is_err());
    }
}
