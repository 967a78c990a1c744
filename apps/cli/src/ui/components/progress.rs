use crate::ui::components::Spinner;
use shipyard::application::{PipelineObserver, Stage};
use shipyard::domain::BuildResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One spinner per project root, fed by the pipelines' stage callbacks.
#[derive(Default)]
pub struct BuildProgress {
    spinners: Mutex<HashMap<PathBuf, Spinner>>,
}

impl BuildProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineObserver for BuildProgress {
    fn stage(&self, project: &str, path: &Path, stage: Stage) {
        if let Ok(mut spinners) = self.spinners.lock() {
            spinners
                .entry(path.to_path_buf())
                .or_insert_with(|| Spinner::new(project))
                .set_message(stage.to_string());
        }
    }

    fn finished(&self, path: &Path, result: &BuildResult) {
        let Ok(mut spinners) = self.spinners.lock() else {
            return;
        };
        let spinner = spinners
            .remove(path)
            .unwrap_or_else(|| Spinner::new(result.name.as_str()));

        match (result.built(), result.error()) {
            (Some(built), _) => spinner.success(built.image.reference()),
            (_, Some(error)) => spinner.fail(first_line(&error.to_string())),
            _ => spinner.fail("no result"),
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipyard::domain::PipelineError;

    #[test]
    fn same_named_projects_keep_their_own_spinner() {
        let progress = BuildProgress::new();
        let first = Path::new("/x/arena");
        let second = Path::new("/y/arena");

        progress.stage("arena", first, Stage::Loading);
        progress.stage("arena", second, Stage::Loading);
        progress.stage("arena", first, Stage::Building);
        assert_eq!(progress.spinners.lock().unwrap().len(), 2);

        let failed = BuildResult::failed("arena", first, PipelineError::Staging("disk full".to_string()));
        progress.finished(first, &failed);
        assert_eq!(progress.spinners.lock().unwrap().len(), 1);

        let spinners = progress.spinners.lock().unwrap();
        assert!(spinners.contains_key(second));
    }
}
