use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphError, StoreError};
use crate::exec::CalculationProcess;
use crate::workspace::{Connection, DataType, Node, ScopePath, SocketValues, Workspace};

pub mod memory;

pub use memory::MemoryStore;

/// Declaration of one named, typed field of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSchema {
    pub name: String,
    pub data_type: DataType,
    pub required: bool,
    pub unique: bool,
}

impl ValueSchema {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            required: true,
            unique: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// An ordered collection of entries conforming to a declared schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub schema: Vec<ValueSchema>,
}

/// One record of named values belonging to a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub values: SocketValues,
}

/// Per-record callback driven by [`DatasetStore::for_each_entry`]. The error
/// type is [`GraphError`] so a failing scope iteration propagates with its
/// original kind instead of being flattened into a storage error.
pub type EntryVisitor<'a> =
    &'a mut (dyn FnMut(Entry) -> BoxFuture<'a, Result<(), GraphError>> + Send);

/// Periodic progress callback: `(processed_so_far, total)`.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Key-addressed record store for the graph itself.
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    async fn get_workspace(&self, id: &str) -> Result<Option<Workspace>, StoreError>;
    async fn save_workspace(&self, workspace: Workspace) -> Result<(), StoreError>;

    async fn get_node(&self, id: &str) -> Result<Option<Node>, StoreError>;
    async fn nodes_in_scope(
        &self,
        workspace_id: &str,
        scope_path: &ScopePath,
    ) -> Result<Vec<Node>, StoreError>;
    async fn save_node(&self, node: Node) -> Result<(), StoreError>;
    async fn delete_node(&self, id: &str) -> Result<(), StoreError>;

    async fn get_connection(&self, id: &str) -> Result<Option<Connection>, StoreError>;
    async fn connections_in_workspace(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<Connection>, StoreError>;
    async fn save_connection(&self, connection: Connection) -> Result<(), StoreError>;
    async fn delete_connection(&self, id: &str) -> Result<(), StoreError>;

    async fn get_process(&self, id: &str) -> Result<Option<CalculationProcess>, StoreError>;
    async fn save_process(&self, process: CalculationProcess) -> Result<(), StoreError>;

    /// Persist a user-visible artifact produced by a terminal node.
    async fn save_result(&self, node_id: &str, result: Value) -> Result<(), StoreError>;
    async fn get_result(&self, node_id: &str) -> Result<Option<Value>, StoreError>;
}

/// Dataset and entry storage, consumed opaquely by the engines.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>, StoreError>;
    async fn get_schema(&self, id: &str) -> Result<Vec<ValueSchema>, StoreError>;
    async fn create_dataset(
        &self,
        name: &str,
        schema: Vec<ValueSchema>,
    ) -> Result<Dataset, StoreError>;

    /// Append an entry, enforcing required/unknown-field checks and the
    /// schema's uniqueness constraints.
    async fn create_entry(
        &self,
        dataset_id: &str,
        values: SocketValues,
    ) -> Result<Entry, StoreError>;

    /// Drive `visitor` over every entry of a dataset in bounded pages.
    /// `progress` is invoked once per page, not per record. Returns the
    /// number of visited entries.
    async fn for_each_entry(
        &self,
        dataset_id: &str,
        visitor: EntryVisitor<'_>,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<u64, GraphError>;
}

/// The full storage surface the engines are handed.
pub trait Store: WorkspaceStore + DatasetStore {}

impl<T: WorkspaceStore + DatasetStore> Store for T {}
