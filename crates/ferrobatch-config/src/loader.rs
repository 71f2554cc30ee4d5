//! Task file loading and validation
//!
//! A task file is parsed into a generic value tree first and then checked
//! field by field, so one pass reports every problem in the file instead of
//! stopping at the first one.

use crate::{ConfigError, ConfigResult, ConfigViolation};
use ferrobatch_types::{NamePattern, Task, TransferAction};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Serialization format of a task file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFileFormat {
    /// JSON document
    Json,
    /// YAML document
    Yaml,
    /// TOML document, tasks given as `[[tasks]]`
    Toml,
}

impl TaskFileFormat {
    /// Detect the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            Some("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

const FIELD_NAME: &str = "name";
const FIELD_ACTION: &str = "action";
const FIELD_SOURCE: &str = "sourceFolder";
const FIELD_RECURSE: &str = "recurse";
const FIELD_REGEX: &str = "nameRegex";
const FIELD_DESTINATION: &str = "destinationFolder";
const FIELD_OVERWRITE: &str = "overwriteExisting";
const FIELD_MAX_AGE: &str = "maxAgeDays";

/// Loads task files into validated [`Task`] lists
#[derive(Debug, Clone)]
pub struct TaskFileLoader {
    check_folders: bool,
}

impl TaskFileLoader {
    /// Create a loader that also checks source and destination folders exist
    pub fn new() -> Self {
        Self {
            check_folders: true,
        }
    }

    /// Skip the folder existence checks
    pub fn without_folder_checks(mut self) -> Self {
        self.check_folders = false;
        self
    }

    /// Load and validate a task file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Vec<Task>> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let value = Self::parse_value(&text, TaskFileFormat::from_path(path), path)?;
        let tasks = self.validate(&value)?;
        info!(path = %path.display(), tasks = tasks.len(), "Loaded task file");
        Ok(tasks)
    }

    /// Parse and validate task file text
    pub fn parse_str(&self, text: &str, format: TaskFileFormat) -> ConfigResult<Vec<Task>> {
        let value = Self::parse_value(text, format, Path::new("<inline>"))?;
        self.validate(&value)
    }

    fn parse_value(text: &str, format: TaskFileFormat, path: &Path) -> ConfigResult<Value> {
        // Editors on Windows like to prepend a byte order mark.
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let parsed = match format {
            TaskFileFormat::Json => serde_json::from_str::<Value>(text).map_err(|e| e.to_string()),
            TaskFileFormat::Yaml => serde_yaml::from_str::<Value>(text).map_err(|e| e.to_string()),
            TaskFileFormat::Toml => toml::from_str::<Value>(text).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn validate(&self, value: &Value) -> ConfigResult<Vec<Task>> {
        let mut violations = Vec::new();

        let entries = match value {
            Value::Array(entries) => Some(entries),
            Value::Object(map) => match lookup(map, "tasks") {
                Some(Value::Array(entries)) => Some(entries),
                Some(_) => {
                    violations.push(ConfigViolation::file("tasks", "expected an array of tasks"));
                    None
                }
                None => {
                    violations.push(ConfigViolation::file("tasks", "missing required field"));
                    None
                }
            },
            _ => {
                violations.push(ConfigViolation::file(
                    "<root>",
                    "expected an array of tasks or an object with a `tasks` array",
                ));
                None
            }
        };

        let mut tasks = Vec::new();
        if let Some(entries) = entries {
            if entries.is_empty() {
                violations.push(ConfigViolation::file("tasks", "no tasks defined"));
            }
            for (index, entry) in entries.iter().enumerate() {
                if let Some(task) = self.validate_task(index, entry, &mut violations) {
                    tasks.push(task);
                }
            }
        }

        if violations.is_empty() {
            Ok(tasks)
        } else {
            debug!(count = violations.len(), "Task file rejected");
            Err(ConfigError::Invalid { violations })
        }
    }

    fn validate_task(
        &self,
        index: usize,
        entry: &Value,
        violations: &mut Vec<ConfigViolation>,
    ) -> Option<Task> {
        let Some(map) = entry.as_object() else {
            violations.push(ConfigViolation::task(index, "<task>", "expected an object"));
            return None;
        };

        let mut fields = FieldReader {
            index,
            map,
            violations,
        };

        let name = fields
            .optional_string(FIELD_NAME)
            .unwrap_or_else(|| format!("task-{}", index + 1));

        let action = fields.string(FIELD_ACTION).and_then(|raw| {
            raw.parse::<TransferAction>()
                .map_err(|_| {
                    fields.violation(
                        FIELD_ACTION,
                        format!("unsupported action '{}', expected 'copy' or 'move'", raw),
                    )
                })
                .ok()
        });

        let source_folder = fields.string(FIELD_SOURCE).and_then(|raw| {
            fields.folder(FIELD_SOURCE, &raw, self.check_folders)
        });
        let destination_folder = fields.string(FIELD_DESTINATION).and_then(|raw| {
            fields.folder(FIELD_DESTINATION, &raw, self.check_folders)
        });

        let name_pattern = fields.string(FIELD_REGEX).and_then(|raw| {
            if raw.is_empty() {
                fields.violation(
                    FIELD_REGEX,
                    "must not be empty, use '.*' to match every file".to_string(),
                );
                return None;
            }
            NamePattern::new(&raw)
                .map_err(|e| fields.violation(FIELD_REGEX, e.to_string()))
                .ok()
        });

        let recurse = fields.boolean(FIELD_RECURSE);
        let overwrite_existing = fields.boolean(FIELD_OVERWRITE);
        let max_age_days = fields.days(FIELD_MAX_AGE);

        Some(Task {
            name,
            action: action?,
            source_folder: source_folder?,
            recurse: recurse?,
            name_pattern: name_pattern?,
            destination_folder: destination_folder?,
            overwrite_existing: overwrite_existing?,
            max_age_days: max_age_days?,
        })
    }
}

impl Default for TaskFileLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Looks up a camelCase key, falling back to its PascalCase spelling
fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        let mut chars = key.chars();
        let pascal: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => return None,
        };
        map.get(&pascal)
    })
}

struct FieldReader<'a> {
    index: usize,
    map: &'a Map<String, Value>,
    violations: &'a mut Vec<ConfigViolation>,
}

impl<'a> FieldReader<'a> {
    fn violation(&mut self, field: &str, message: String) {
        self.violations
            .push(ConfigViolation::task(self.index, field, message));
    }

    fn required(&mut self, field: &str) -> Option<&'a Value> {
        match lookup(self.map, field) {
            None | Some(Value::Null) => {
                self.violations.push(ConfigViolation::task(
                    self.index,
                    field,
                    "missing required field",
                ));
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, field: &str) -> Option<String> {
        match self.required(field)? {
            Value::String(text) => Some(text.clone()),
            other => {
                let message = format!("expected a string, found {}", type_name(other));
                self.violation(field, message);
                None
            }
        }
    }

    fn optional_string(&mut self, field: &str) -> Option<String> {
        match lookup(self.map, field)? {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            Value::String(_) | Value::Null => None,
            other => {
                let message = format!("expected a string, found {}", type_name(other));
                self.violation(field, message);
                None
            }
        }
    }

    fn boolean(&mut self, field: &str) -> Option<bool> {
        match self.required(field)? {
            Value::Bool(flag) => Some(*flag),
            other => {
                let message = format!("expected a boolean, found {}", type_name(other));
                self.violation(field, message);
                None
            }
        }
    }

    fn days(&mut self, field: &str) -> Option<u32> {
        let value = self.required(field)?;
        match value.as_u64().map(u32::try_from) {
            Some(Ok(days)) => Some(days),
            _ => {
                let message = format!("expected a non-negative integer, found {}", value);
                self.violation(field, message);
                None
            }
        }
    }

    fn folder(&mut self, field: &str, raw: &str, check_exists: bool) -> Option<PathBuf> {
        if raw.trim().is_empty() {
            self.violation(field, "must not be empty".to_string());
            return None;
        }
        let path = PathBuf::from(raw);
        if check_exists && !path.is_dir() {
            let message = format!("folder '{}' does not exist or is not a directory", raw);
            self.violation(field, message);
            return None;
        }
        Some(path)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
