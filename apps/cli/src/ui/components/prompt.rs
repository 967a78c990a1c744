use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;

/// Masked input; `None` when the operator cancels or leaves it empty.
pub fn secret(prompt: &str) -> Option<String> {
    crate::ui::multi_progress().suspend(|| {
        cliclack::password(prompt)
            .mask('▪')
            .interact()
            .ok()
            .filter(|s| !s.is_empty())
    })
}

pub fn is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// What the operator typed when no project paths were passed.
#[derive(Debug, Default, PartialEq)]
pub struct ProjectSelection {
    pub engine_jar: Option<PathBuf>,
    pub paths: Vec<PathBuf>,
}

/// Asks for an optional local engine jar, then project paths until an empty
/// line. Falls back to reading the same answers from stdin when it is not a
/// terminal.
pub fn select_projects() -> io::Result<ProjectSelection> {
    if !is_interactive() {
        return read_selection(io::stdin().lock());
    }

    let engine: String = cliclack::input("Local engine jar (leave empty to download the latest release)")
        .placeholder("path/to/local-engine.jar")
        .required(false)
        .interact()?;

    let mut paths = Vec::new();
    loop {
        let label = format!("Project path #{} (empty line to finish)", paths.len() + 1);
        let line: String = cliclack::input(label).required(false).interact()?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        paths.push(PathBuf::from(line));
    }

    Ok(ProjectSelection {
        engine_jar: non_empty_path(&engine),
        paths,
    })
}

/// First line is the engine jar (may be blank), then one path per line
/// until a blank line or EOF.
pub fn read_selection(input: impl BufRead) -> io::Result<ProjectSelection> {
    let mut lines = input.lines();
    let engine_jar = match lines.next() {
        Some(line) => non_empty_path(&line?),
        None => return Ok(ProjectSelection::default()),
    };

    let mut paths = Vec::new();
    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        paths.push(PathBuf::from(line));
    }

    Ok(ProjectSelection { engine_jar, paths })
}

fn non_empty_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| PathBuf::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_engine_then_paths() {
        let input = "/opt/engine.jar\n./arena\n ./lobby \n\n./ignored\n";
        let selection = read_selection(input.as_bytes()).unwrap();
        assert_eq!(
            selection,
            ProjectSelection {
                engine_jar: Some(PathBuf::from("/opt/engine.jar")),
                paths: vec![PathBuf::from("./arena"), PathBuf::from("./lobby")],
            }
        );
    }

    #[test]
    fn blank_engine_line_means_download() {
        let selection = read_selection("\n./arena".as_bytes()).unwrap();
        assert_eq!(selection.engine_jar, None);
        assert_eq!(selection.paths, vec![PathBuf::from("./arena")]);
    }

    #[test]
    fn empty_input() {
        assert_eq!(read_selection("".as_bytes()).unwrap(), ProjectSelection::default());
    }
}
