use ahash::AHashMap;
use async_trait::async_trait;
use itertools::Itertools;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{GraphError, StoreError};
use crate::exec::CalculationProcess;
use crate::store::{
    Dataset, DatasetStore, Entry, EntryVisitor, ProgressFn, ValueSchema, WorkspaceStore,
};
use crate::workspace::{Connection, Node, ScopePath, SocketValues, Workspace};

/// Page size used by [`MemoryStore::for_each_entry`]. The lock is released
/// between pages so long iterations do not starve writers.
const ENTRY_PAGE_SIZE: usize = 256;

#[derive(Default)]
struct Tables {
    workspaces: AHashMap<String, Workspace>,
    nodes: AHashMap<String, Node>,
    connections: AHashMap<String, Connection>,
    processes: AHashMap<String, CalculationProcess>,
    results: AHashMap<String, Value>,
    datasets: AHashMap<String, Dataset>,
    entries: AHashMap<String, Vec<Entry>>,
}

/// In-memory store backing tests, the CLI, and embedding scenarios where no
/// external database is wanted.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of entries currently held for a dataset.
    pub async fn entry_count(&self, dataset_id: &str) -> u64 {
        let tables = self.tables.read().await;
        tables
            .entries
            .get(dataset_id)
            .map(|e| e.len() as u64)
            .unwrap_or(0)
    }

    /// Snapshot of a dataset's entries, mainly for assertions in tests.
    pub async fn entries_of(&self, dataset_id: &str) -> Vec<Entry> {
        let tables = self.tables.read().await;
        tables.entries.get(dataset_id).cloned().unwrap_or_default()
    }
}

fn validate_entry_values(
    schema: &[ValueSchema],
    values: &SocketValues,
) -> Result<(), StoreError> {
    for field in schema {
        if field.required && !values.contains_key(&field.name) {
            return Err(StoreError::ConstraintViolation(format!(
                "Missing required field '{}'",
                field.name
            )));
        }
    }
    if let Some(unknown) = values.keys().find(|k| !schema.iter().any(|f| &f.name == *k)) {
        return Err(StoreError::ConstraintViolation(format!(
            "Unknown field '{}'",
            unknown
        )));
    }
    Ok(())
}

#[async_trait]
impl WorkspaceStore for MemoryStore {
    async fn get_workspace(&self, id: &str) -> Result<Option<Workspace>, StoreError> {
        Ok(self.tables.read().await.workspaces.get(id).cloned())
    }

    async fn save_workspace(&self, workspace: Workspace) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .workspaces
            .insert(workspace.id.clone(), workspace);
        Ok(())
    }

    async fn get_node(&self, id: &str) -> Result<Option<Node>, StoreError> {
        Ok(self.tables.read().await.nodes.get(id).cloned())
    }

    async fn nodes_in_scope(
        &self,
        workspace_id: &str,
        scope_path: &ScopePath,
    ) -> Result<Vec<Node>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .nodes
            .values()
            .filter(|n| n.workspace_id == workspace_id && &n.scope_path == scope_path)
            .cloned()
            .collect())
    }

    async fn save_node(&self, node: Node) -> Result<(), StoreError> {
        self.tables.write().await.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<(), StoreError> {
        self.tables.write().await.nodes.remove(id);
        Ok(())
    }

    async fn get_connection(&self, id: &str) -> Result<Option<Connection>, StoreError> {
        Ok(self.tables.read().await.connections.get(id).cloned())
    }

    async fn connections_in_workspace(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<Connection>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .connections
            .values()
            .filter(|c| c.workspace_id == workspace_id)
            .cloned()
            .collect())
    }

    async fn save_connection(&self, connection: Connection) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .connections
            .insert(connection.id.clone(), connection);
        Ok(())
    }

    async fn delete_connection(&self, id: &str) -> Result<(), StoreError> {
        self.tables.write().await.connections.remove(id);
        Ok(())
    }

    async fn get_process(&self, id: &str) -> Result<Option<CalculationProcess>, StoreError> {
        Ok(self.tables.read().await.processes.get(id).cloned())
    }

    async fn save_process(&self, process: CalculationProcess) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .processes
            .insert(process.id.clone(), process);
        Ok(())
    }

    async fn save_result(&self, node_id: &str, result: Value) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .results
            .insert(node_id.to_string(), result);
        Ok(())
    }

    async fn get_result(&self, node_id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.tables.read().await.results.get(node_id).cloned())
    }
}

#[async_trait]
impl DatasetStore for MemoryStore {
    async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>, StoreError> {
        Ok(self.tables.read().await.datasets.get(id).cloned())
    }

    async fn get_schema(&self, id: &str) -> Result<Vec<ValueSchema>, StoreError> {
        let tables = self.tables.read().await;
        tables
            .datasets
            .get(id)
            .map(|d| d.schema.clone())
            .ok_or_else(|| StoreError::NotFound {
                kind: "dataset",
                id: id.to_string(),
            })
    }

    async fn create_dataset(
        &self,
        name: &str,
        schema: Vec<ValueSchema>,
    ) -> Result<Dataset, StoreError> {
        if let Some(dup) = schema.iter().map(|f| &f.name).duplicates().next() {
            return Err(StoreError::ConstraintViolation(format!(
                "Schema declares field '{}' more than once",
                dup
            )));
        }
        let dataset = Dataset {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            schema,
        };
        let mut tables = self.tables.write().await;
        tables.datasets.insert(dataset.id.clone(), dataset.clone());
        tables.entries.insert(dataset.id.clone(), Vec::new());
        Ok(dataset)
    }

    async fn create_entry(
        &self,
        dataset_id: &str,
        values: SocketValues,
    ) -> Result<Entry, StoreError> {
        let mut tables = self.tables.write().await;
        let schema = tables
            .datasets
            .get(dataset_id)
            .map(|d| d.schema.clone())
            .ok_or_else(|| StoreError::NotFound {
                kind: "dataset",
                id: dataset_id.to_string(),
            })?;
        validate_entry_values(&schema, &values)?;

        let existing = tables.entries.entry(dataset_id.to_string()).or_default();
        for field in schema.iter().filter(|f| f.unique) {
            if let Some(candidate) = values.get(&field.name)
                && existing
                    .iter()
                    .any(|e| e.values.get(&field.name) == Some(candidate))
            {
                return Err(StoreError::DuplicateKey {
                    dataset_id: dataset_id.to_string(),
                    field: field.name.clone(),
                });
            }
        }

        let entry = Entry {
            id: uuid::Uuid::new_v4().to_string(),
            values,
        };
        existing.push(entry.clone());
        Ok(entry)
    }

    async fn for_each_entry(
        &self,
        dataset_id: &str,
        visitor: EntryVisitor<'_>,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<u64, GraphError> {
        let total = {
            let tables = self.tables.read().await;
            tables
                .entries
                .get(dataset_id)
                .ok_or(StoreError::NotFound {
                    kind: "dataset",
                    id: dataset_id.to_string(),
                })?
                .len() as u64
        };

        let mut visited: u64 = 0;
        let mut offset = 0usize;
        loop {
            // Page-wise snapshot; entries appended mid-iteration are not
            // revisited because the offset only moves forward.
            let page: Vec<Entry> = {
                let tables = self.tables.read().await;
                match tables.entries.get(dataset_id) {
                    Some(entries) => entries
                        .iter()
                        .skip(offset)
                        .take(ENTRY_PAGE_SIZE)
                        .cloned()
                        .collect(),
                    None => Vec::new(),
                }
            };
            if page.is_empty() {
                break;
            }
            offset += page.len();
            for entry in page {
                visitor(entry).await?;
                visited += 1;
            }
            if let Some(report) = progress {
                report(visited, total);
            }
            if visited >= total {
                break;
            }
        }
        Ok(visited)
    }
}
