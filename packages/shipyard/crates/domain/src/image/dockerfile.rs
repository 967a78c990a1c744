use super::ImageSettings;
use std::fmt::Write;

/// Server settings baked into every image as `ENV` lines.
const SERVER_ENV: &[(&str, &str)] = &[
    ("EULA", "TRUE"),
    ("ENABLE_RCON", "true"),
    ("RCON_PORT", "25575"),
    ("DEBUG", "true"),
    ("DEBUG_PORT", "5005"),
    ("GENERATE_STRUCTURES", "false"),
    ("ALLOW_NETHER", "false"),
    ("ALLOW_FLIGHT", "true"),
    ("SPAWN_PROTECTION", "0"),
    ("LEVEL_TYPE", "FLAT"),
    ("LEVEL_TYPE_FLAT_GENERATOR_SETTINGS", "{}"),
];

/// Which optional directories made it into the staging directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StagedLayout {
    pub assets: bool,
    pub config: bool,
    pub server: bool,
}

/// Renders the per-project Dockerfile. The output is a pure function of the
/// settings and the staged layout.
pub struct DockerfileTemplate<'a> {
    settings: &'a ImageSettings,
}

impl<'a> DockerfileTemplate<'a> {
    pub fn new(settings: &'a ImageSettings) -> Self {
        Self { settings }
    }

    pub fn render(&self, layout: StagedLayout) -> String {
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "FROM {}\n", self.settings.base_image);
        let _ = writeln!(out, "ENV TYPE={}", self.settings.server_type);
        let _ = writeln!(out, "ENV VERSION={}", self.settings.version);
        let _ = writeln!(out, "ENV MEMORY={}", self.settings.memory);
        for (key, value) in SERVER_ENV {
            let _ = writeln!(out, "ENV {}={}", key, value);
        }
        out.push('\n');

        out.push_str("COPY --chown=1000:1000 plugins/ /data/plugins/\n");
        if layout.assets {
            out.push_str("COPY --chown=1000:1000 assets/ /data/assets/\n");
        }
        if layout.config {
            out.push_str("COPY --chown=1000:1000 config/ /data/config/\n");
        }
        if layout.server {
            out.push_str("COPY --chown=1000:1000 server/ /server/\n");
        }
        out.push('\n');

        out.push_str("RUN chmod -R 755 /data/plugins && chmod -R 755 /data/config || true\n\n");
        out.push_str("EXPOSE 25565\n");
        out.push_str("EXPOSE 5005\n");

        out
    }
}
