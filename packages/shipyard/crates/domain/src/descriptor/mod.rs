//! The shared deployment descriptor (a Compose document) and the merge that
//! adds project services to it.
//!
//! The merge only touches the project services it is given and the baseline
//! entries that are missing. Everything else keeps its value and position.

mod service;

pub use service::{service_definition, ProjectService};

use serde_yaml::{Mapping, Value};
use thiserror::Error;

pub const NETWORK_NAME: &str = "shipyard-net";
pub const DEBUG_PORT: u16 = 5005;
pub const READINESS_LINE: &str = "For help, type \"help\"";

/// Infrastructure services every descriptor carries.
pub const BASELINE_SERVICES: [&str; 4] = ["zookeeper", "kafka", "mongodb", "velocity"];

const BASELINE_YAML: &str = include_str!("baseline.yaml");

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DescriptorError {
    #[error("invalid YAML: {0}")]
    Parse(String),
    #[error("failed to serialize descriptor: {0}")]
    Serialize(String),
    #[error("`{0}` must be a mapping")]
    Shape(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentDescriptor {
    doc: Mapping,
}

impl DeploymentDescriptor {
    /// The baseline document: infrastructure services and the shared network.
    pub fn baseline() -> Result<Self, DescriptorError> {
        Self::parse_mapping(BASELINE_YAML)
    }

    /// Parses an existing descriptor. An empty document yields the baseline.
    pub fn parse(content: &str) -> Result<Self, DescriptorError> {
        if content.trim().is_empty() {
            return Self::baseline();
        }
        Self::parse_mapping(content)
    }

    fn parse_mapping(content: &str) -> Result<Self, DescriptorError> {
        let value: Value =
            serde_yaml::from_str(content).map_err(|e| DescriptorError::Parse(e.to_string()))?;
        match value {
            Value::Mapping(doc) => Ok(Self { doc }),
            Value::Null => Self::baseline(),
            _ => Err(DescriptorError::Shape("document")),
        }
    }

    pub fn to_yaml(&self) -> Result<String, DescriptorError> {
        serde_yaml::to_string(&self.doc).map_err(|e| DescriptorError::Serialize(e.to_string()))
    }

    pub fn service(&self, name: &str) -> Option<&Value> {
        self.doc
            .get("services")
            .and_then(Value::as_mapping)
            .and_then(|services| services.get(name))
    }

    pub fn service_names(&self) -> Vec<String> {
        self.doc
            .get("services")
            .and_then(Value::as_mapping)
            .map(|services| {
                services
                    .keys()
                    .filter_map(|k| k.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Services carrying the `shipyard.managed` label.
    pub fn managed_service_names(&self) -> Vec<String> {
        self.service_names()
            .into_iter()
            .filter(|name| {
                self.service(name)
                    .and_then(|svc| svc.get("labels"))
                    .and_then(|labels| labels.get("shipyard.managed"))
                    .is_some()
            })
            .collect()
    }

    /// Adds whatever part of the baseline is missing. Existing entries,
    /// including baseline services an operator edited, are left alone.
    pub fn ensure_baseline(&mut self) -> Result<(), DescriptorError> {
        let baseline = Self::baseline()?;

        if !self.doc.contains_key("version") {
            if let Some(version) = baseline.doc.get("version") {
                self.doc.insert(Value::from("version"), version.clone());
            }
        }

        for section in ["services", "networks", "volumes"] {
            let Some(defaults) = baseline.doc.get(section).and_then(Value::as_mapping) else {
                continue;
            };
            let target = self.section_mut(section)?;
            for (key, value) in defaults {
                if !target.contains_key(key) {
                    target.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(())
    }

    /// Inserts or replaces one service entry.
    pub fn upsert_service(&mut self, name: &str, definition: Value) -> Result<(), DescriptorError> {
        self.section_mut("services")?
            .insert(Value::from(name), definition);
        Ok(())
    }

    /// Applies one run's merge: baseline first, then every project service.
    pub fn merge(&mut self, services: &[(String, Value)]) -> Result<(), DescriptorError> {
        self.ensure_baseline()?;
        for (name, definition) in services {
            self.upsert_service(name, definition.clone())?;
        }
        Ok(())
    }

    fn section_mut(&mut self, section: &'static str) -> Result<&mut Mapping, DescriptorError> {
        let key = Value::from(section);
        let needs_init = matches!(self.doc.get(&key), None | Some(Value::Null));
        if needs_init {
            self.doc.insert(key.clone(), Value::Mapping(Mapping::new()));
        }
        self.doc
            .get_mut(&key)
            .and_then(Value::as_mapping_mut)
            .ok_or(DescriptorError::Shape(section))
    }
}
