use crate::GameProperties;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub level: ValidationLevel,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.issues.push(ValidationIssue {
            level: ValidationLevel::Error,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            level: ValidationLevel::Warning,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.level == ValidationLevel::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.level == ValidationLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.level == ValidationLevel::Warning)
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PropertiesValidator;

impl PropertiesValidator {
    pub fn validate(props: &GameProperties) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_required_fields(props, &mut result);
        Self::validate_libraries(props, &mut result);
        Self::validate_secret_keys(props, &mut result);

        result
    }

    fn validate_required_fields(props: &GameProperties, result: &mut ValidationResult) {
        if props.project_id.trim().is_empty() {
            result.add_warning(
                "projectId",
                "RECOMMENDED: Add 'projectId'; the service label will be empty",
            );
        }

        if props.game.name.is_empty() {
            result.add_warning(
                "game.name",
                "RECOMMENDED: Add 'game.name'; the directory name is used instead",
            );
        }
    }

    fn validate_libraries(props: &GameProperties, result: &mut ValidationResult) {
        let mut seen = std::collections::HashSet::new();
        for lib in props.libraries() {
            if lib.trim().is_empty() {
                result.add_error("dependencies.libraries", "Empty library key");
            } else if !seen.insert(lib.as_str()) {
                result.add_warning(
                    "dependencies.libraries",
                    format!("Library '{}' is listed more than once", lib),
                );
            }
        }
    }

    fn validate_secret_keys(props: &GameProperties, result: &mut ValidationResult) {
        for key in &props.secret_environment_variable_keys {
            let valid = !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !key.starts_with(|c: char| c.is_ascii_digit());
            if !valid {
                result.add_error(
                    "secretEnvironmentVariableKeys",
                    format!("'{}' is not a valid environment variable name", key),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_id_is_only_a_warning() {
        let result = PropertiesValidator::validate(&GameProperties::default());
        assert!(result.valid);
        assert!(result.warnings().any(|i| i.field == "projectId"));
    }

    #[test]
    fn duplicate_library_is_only_a_warning() {
        let props = GameProperties::from_yaml(
            "projectId: p\ngame:\n  name: G\ndependencies:\n  libraries: [A, A]\n",
        )
        .unwrap();
        let result = PropertiesValidator::validate(&props);
        assert!(result.valid);
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn rejects_bad_secret_key() {
        let props = GameProperties::from_yaml(
            "projectId: p\nsecretEnvironmentVariableKeys: [\"1BAD\", \"GOOD_KEY\"]\n",
        )
        .unwrap();
        let result = PropertiesValidator::validate(&props);
        assert_eq!(result.errors().count(), 1);
    }
}
