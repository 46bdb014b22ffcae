//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types and traits of the kairo crate.

// Engines
pub use crate::exec::{
    CalculationProcess, CalculationTracker, GraphExecutor, MetaResolver, ProcessState,
    is_meta_valid,
};

// Graph model and mutation
pub use crate::workspace::{
    Connection, DataType, Form, Node, SCOPE_INPUT_TYPE, SCOPE_OUTPUT_TYPE, ScopePath, SocketDef,
    SocketMeta, SocketMetas, SocketRef, SocketValues, Workspace, WorkspaceManager,
};

// Node type contract and registry
pub use crate::types::{
    ExecutionContext, NodeOutput, NodeType, NodeTypeRegistry, ScopedNodeType,
};

// Storage
pub use crate::store::{
    Dataset, DatasetStore, Entry, MemoryStore, Store, ValueSchema, WorkspaceStore,
};

// Error types
pub use crate::error::{ConnectionError, GraphError, StoreError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
