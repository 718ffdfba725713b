//! The metadata view of a workflow that queries are evaluated against.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read-only access to the fields a query can test.
///
/// The retrieval layer implements this for whatever it stores; the evaluator
/// never mutates a record.
pub trait Metadata {
    fn name(&self) -> &str;
    fn project_name(&self) -> &str;
    fn generic_information(&self) -> &HashMap<String, String>;
    fn variable(&self) -> &HashMap<String, String>;
}

/// Metadata extracted from a workflow definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    pub name: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub generic_information: HashMap<String, String>,
    #[serde(default, alias = "variables")]
    pub variable: HashMap<String, String>,
}

impl WorkflowMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = project_name.into();
        self
    }

    pub fn with_generic_information(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.generic_information.insert(key.into(), value.into());
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variable.insert(key.into(), value.into());
        self
    }
}

impl Metadata for WorkflowMetadata {
    fn name(&self) -> &str {
        &self.name
    }

    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn generic_information(&self) -> &HashMap<String, String> {
        &self.generic_information
    }

    fn variable(&self) -> &HashMap<String, String> {
        &self.variable
    }
}

impl<M: Metadata + ?Sized> Metadata for &M {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn project_name(&self) -> &str {
        (**self).project_name()
    }

    fn generic_information(&self) -> &HashMap<String, String> {
        (**self).generic_information()
    }

    fn variable(&self) -> &HashMap<String, String> {
        (**self).variable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_missing_fields() {
        let metadata: WorkflowMetadata = serde_json::from_str(r#"{"name": "D", "variable": {"CPU": "5"}}"#).unwrap();
        assert_eq!(metadata.name(), "D");
        assert_eq!(metadata.project_name(), "");
        assert!(metadata.generic_information().is_empty());
        assert_eq!(metadata.variable().get("CPU").map(String::as_str), Some("5"));
    }

    #[test]
    fn test_builder() {
        let metadata = WorkflowMetadata::new("E")
            .with_project_name("Fabien")
            .with_generic_information("toto", "Google")
            .with_variable("tata", "Amazon");
        assert_eq!(metadata.project_name, "Fabien");
        assert_eq!(metadata.generic_information["toto"], "Google");
        assert_eq!(metadata.variable["tata"], "Amazon");
    }
}
