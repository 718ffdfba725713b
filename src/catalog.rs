//! In-memory workflow catalog: buckets hold workflows, workflows hold an
//! ordered list of revisions. Queries are applied to revision metadata.

use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::engine::Query;
use crate::record::WorkflowMetadata;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogError {
    pub message: String,
}

impl CatalogError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "catalog error: {}", self.message)
    }
}

impl std::error::Error for CatalogError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRevision {
    pub workflow_id: u64,
    pub revision_id: u64,
    pub metadata: WorkflowMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub id: u64,
    pub bucket_id: u64,
    /// Oldest first.
    pub revisions: Vec<WorkflowRevision>,
}

impl Workflow {
    pub fn latest_revision(&self) -> Option<&WorkflowRevision> {
        self.revisions.last()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    buckets: Vec<Bucket>,
    workflows: Vec<Workflow>,
}

/// On-disk layout: buckets listed with the metadata of each workflow's
/// revisions, oldest first.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    buckets: Vec<BucketFile>,
}

#[derive(Debug, Deserialize)]
struct BucketFile {
    name: String,
    /// Either a single metadata object or `{ "revisions": [...] }`.
    #[serde(default)]
    workflows: Vec<Value>,
}

const REVISIONS_KEY: &str = "revisions";

/// Revision metadata of one workflow entry. An object holding `revisions`
/// may hold nothing else.
fn workflow_revisions(bucket: &str, workflow: Value) -> Result<Vec<WorkflowMetadata>, CatalogError> {
    let invalid = |e: serde_json::Error| {
        CatalogError::new(format!("invalid workflow in bucket '{}': {}", bucket, e))
    };

    match workflow {
        Value::Object(mut fields) if fields.contains_key(REVISIONS_KEY) => {
            if fields.len() > 1 {
                let others: Vec<&str> = fields
                    .keys()
                    .map(String::as_str)
                    .filter(|key| *key != REVISIONS_KEY)
                    .collect();
                return Err(CatalogError::new(format!(
                    "workflow in bucket '{}' mixes '{}' with other fields: {}",
                    bucket,
                    REVISIONS_KEY,
                    others.join(", ")
                )));
            }
            let revisions = fields.remove(REVISIONS_KEY).unwrap_or(Value::Null);
            serde_json::from_value(revisions).map_err(invalid)
        }
        single => serde_json::from_value(single)
            .map(|metadata| vec![metadata])
            .map_err(invalid),
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a catalog from JSON.
    ///
    /// ```json
    /// { "buckets": [ { "name": "bucket1", "workflows": [
    ///     { "name": "A", "variable": { "CPU": "4" } },
    ///     { "revisions": [ { "name": "B" }, { "name": "B", "project_name": "P" } ] }
    /// ] } ] }
    /// ```
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref).map_err(|e| {
            CatalogError::new(format!("cannot read catalog file {}: {}", path_ref.display(), e))
        })?;
        let catalog = Self::from_json_str(&content).map_err(|e| {
            CatalogError::new(format!("{} ({})", e.message, path_ref.display()))
        })?;
        info!(
            "loaded {} bucket(s) and {} workflow(s) from {}",
            catalog.buckets.len(),
            catalog.workflows.len(),
            path_ref.display()
        );
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content)
            .map_err(|e| CatalogError::new(format!("invalid catalog JSON: {}", e)))?;

        let mut catalog = Catalog::new();
        for bucket in file.buckets {
            let bucket_id = catalog.create_bucket(&bucket.name);
            for workflow in bucket.workflows {
                let mut revisions = workflow_revisions(&bucket.name, workflow)?.into_iter();
                let Some(first) = revisions.next() else {
                    return Err(CatalogError::new(format!(
                        "workflow without revisions in bucket '{}'",
                        bucket.name
                    )));
                };
                let workflow_id = catalog.create_workflow(bucket_id, first)?;
                for metadata in revisions {
                    catalog.create_revision(bucket_id, workflow_id, metadata)?;
                }
            }
        }
        Ok(catalog)
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn bucket_id(&self, name: &str) -> Option<u64> {
        self.buckets.iter().find(|b| b.name == name).map(|b| b.id)
    }

    pub fn create_bucket(&mut self, name: &str) -> u64 {
        let id = self.buckets.len() as u64 + 1;
        self.buckets.push(Bucket {
            id,
            name: name.to_string(),
        });
        debug!("created bucket {} '{}'", id, name);
        id
    }

    /// Creates a workflow whose first revision carries `metadata`.
    pub fn create_workflow(
        &mut self,
        bucket_id: u64,
        metadata: WorkflowMetadata,
    ) -> Result<u64, CatalogError> {
        self.check_bucket(bucket_id)?;
        let id = self.workflows.len() as u64 + 1;
        self.workflows.push(Workflow {
            id,
            bucket_id,
            revisions: vec![WorkflowRevision {
                workflow_id: id,
                revision_id: 1,
                metadata,
            }],
        });
        Ok(id)
    }

    /// Appends a revision and returns its id.
    pub fn create_revision(
        &mut self,
        bucket_id: u64,
        workflow_id: u64,
        metadata: WorkflowMetadata,
    ) -> Result<u64, CatalogError> {
        let workflow = self.workflow_mut(bucket_id, workflow_id)?;
        let revision_id = workflow.latest_revision().map_or(1, |r| r.revision_id + 1);
        workflow.revisions.push(WorkflowRevision {
            workflow_id,
            revision_id,
            metadata,
        });
        Ok(revision_id)
    }

    /// Latest revision of each workflow in the bucket that matches `query`,
    /// in workflow creation order, at most `page_size` of them.
    pub fn find_most_recent_revisions(
        &self,
        bucket_id: u64,
        query: &Query,
        page_size: usize,
    ) -> Result<Vec<&WorkflowRevision>, CatalogError> {
        self.check_bucket(bucket_id)?;
        let latest = self
            .workflows
            .iter()
            .filter(|w| w.bucket_id == bucket_id)
            .filter_map(Workflow::latest_revision);
        let mut selected: Vec<&WorkflowRevision> = latest
            .filter(|revision| query.matches(&revision.metadata))
            .collect();
        selected.truncate(page_size);
        debug!(
            "bucket {}: {} most recent revision(s) match '{}'",
            bucket_id,
            selected.len(),
            query
        );
        Ok(selected)
    }

    /// Every revision of one workflow matching `query`, most recent first.
    pub fn find_all_revisions(
        &self,
        bucket_id: u64,
        workflow_id: u64,
        query: &Query,
        page_size: usize,
    ) -> Result<Vec<&WorkflowRevision>, CatalogError> {
        let workflow = self.workflow(bucket_id, workflow_id)?;
        Ok(workflow
            .revisions
            .iter()
            .rev()
            .filter(|revision| query.matches(&revision.metadata))
            .take(page_size)
            .collect())
    }

    fn check_bucket(&self, bucket_id: u64) -> Result<(), CatalogError> {
        if self.buckets.iter().any(|b| b.id == bucket_id) {
            Ok(())
        } else {
            Err(CatalogError::new(format!("bucket {} not found", bucket_id)))
        }
    }

    fn workflow(&self, bucket_id: u64, workflow_id: u64) -> Result<&Workflow, CatalogError> {
        self.check_bucket(bucket_id)?;
        self.workflows
            .iter()
            .find(|w| w.id == workflow_id && w.bucket_id == bucket_id)
            .ok_or_else(|| {
                CatalogError::new(format!(
                    "workflow {} not found in bucket {}",
                    workflow_id, bucket_id
                ))
            })
    }

    fn workflow_mut(
        &mut self,
        bucket_id: u64,
        workflow_id: u64,
    ) -> Result<&mut Workflow, CatalogError> {
        self.check_bucket(bucket_id)?;
        self.workflows
            .iter_mut()
            .find(|w| w.id == workflow_id && w.bucket_id == bucket_id)
            .ok_or_else(|| {
                CatalogError::new(format!(
                    "workflow {} not found in bucket {}",
                    workflow_id, bucket_id
                ))
            })
    }
}
