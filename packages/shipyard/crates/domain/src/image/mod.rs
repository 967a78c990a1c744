//! Image naming and the generated Dockerfile.

mod dockerfile;

pub use dockerfile::{DockerfileTemplate, StagedLayout};

use crate::allocation::normalize_service_name;
use crate::fingerprint::short_path_digest;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

const TAG_DIGEST_LEN: usize = 8;

/// Engine settings baked into every image and service definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub base_image: String,
    pub memory: String,
    pub server_type: String,
    pub version: String,
    /// Repository prefix, e.g. `shipyard` for `shipyard/<name>:<tag>`.
    pub repository_prefix: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            base_image: "itzg/minecraft-server:latest".to_string(),
            memory: "2G".to_string(),
            server_type: "PAPER".to_string(),
            version: "1.21.8".to_string(),
            repository_prefix: "shipyard".to_string(),
        }
    }
}

/// A deterministic image reference plus any secondary tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub repository: String,
    pub tag: String,
    pub extra_tags: Vec<String>,
}

impl ImageRef {
    /// `<prefix>/<normalized name>:<8 hex of path digest>`, with secondary
    /// tags derived from the game and display names.
    pub fn for_project(
        prefix: &str,
        name: &str,
        path: &Path,
        game_name: &str,
        display_name: &str,
    ) -> Self {
        let repository = format!("{}/{}", prefix, normalize_service_name(name));
        let tag = short_path_digest(path, TAG_DIGEST_LEN);

        let mut extra_tags = Vec::new();
        for candidate in [sanitize_tag(game_name), sanitize_tag(&strip_colour_codes(display_name))] {
            if !candidate.is_empty() && candidate != tag && !extra_tags.contains(&candidate) {
                extra_tags.push(candidate);
            }
        }

        Self {
            repository,
            tag,
            extra_tags,
        }
    }

    /// Drops the name-based tags, leaving only the path-derived one.
    pub fn without_extra_tags(mut self) -> Self {
        self.extra_tags.clear();
        self
    }

    /// The primary reference, as written into the deployment descriptor.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }

    /// Every reference to pass to `docker build -t`.
    pub fn all_references(&self) -> Vec<String> {
        std::iter::once(self.reference())
            .chain(
                self.extra_tags
                    .iter()
                    .map(|t| format!("{}:{}", self.repository, t)),
            )
            .collect()
    }
}

fn colour_code_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)§[0-9a-fk-or]").ok())
        .as_ref()
}

/// Removes `§x` formatting codes from a display name.
pub fn strip_colour_codes(text: &str) -> String {
    match colour_code_pattern() {
        Some(pattern) => pattern.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}

/// Lowercase ASCII alphanumerics, `-` and `_`; spaces become `-`.
pub fn sanitize_tag(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => Some(c.to_ascii_lowercase()),
            _ => None,
        })
        .collect::<String>()
        .trim_matches(|c| c == '-' || c == '.')
        .to_string()
}

/// Container name used by the game runtime: `<sanitized game name>-1`.
pub fn container_common_name(game_name: &str) -> String {
    let sanitized: String = game_name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    format!("{}-1", sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn image_ref_is_deterministic() {
        let path = Path::new("/work/arena");
        let a = ImageRef::for_project("shipyard", "Arena", path, "Micro Battles", "§6Micro §lBattles!");
        let b = ImageRef::for_project("shipyard", "Arena", path, "Micro Battles", "§6Micro §lBattles!");

        assert_eq!(a, b);
        assert!(a.reference().starts_with("shipyard/arena:"));
        assert_eq!(a.tag.len(), 8);
        // Display name sanitizes to the same tag as the game name.
        assert_eq!(a.extra_tags, vec!["micro-battles"]);
    }

    #[test]
    fn same_name_different_path_gets_distinct_tags() {
        let a = ImageRef::for_project("s", "arena", Path::new("/x/arena"), "", "");
        let b = ImageRef::for_project("s", "arena", Path::new("/y/arena"), "", "");
        assert_ne!(a.reference(), b.reference());
        assert!(a.extra_tags.is_empty());
    }

    #[test]
    fn strips_colour_codes() {
        assert_eq!(strip_colour_codes("§6Gold §LBold"), "Gold Bold");
    }

    #[test]
    fn common_name() {
        assert_eq!(container_common_name("Micro Battles!"), "MicroBattles-1");
    }
}
