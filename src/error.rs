use thiserror::Error;

/// Errors surfaced by the storage collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Record '{id}' of kind '{kind}' was not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Value for unique field '{field}' already exists in dataset '{dataset_id}'")]
    DuplicateKey { dataset_id: String, field: String },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Errors raised while mutating the connection graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    #[error("Node '{0}' was not found")]
    UnknownNode(String),

    #[error("Connection '{0}' was not found")]
    UnknownConnection(String),

    #[error("Node type '{0}' is not registered")]
    UnknownNodeType(String),

    #[error("Socket '{socket_name}' on node '{node_id}' already has an incoming connection")]
    DuplicateInputBinding {
        node_id: String,
        socket_name: String,
    },

    #[error("Connecting '{from_node_id}' to '{to_node_id}' would close a cycle")]
    CyclicConnection {
        from_node_id: String,
        to_node_id: String,
    },

    #[error("Nodes '{from_node_id}' and '{to_node_id}' live in different workspaces or scopes")]
    CrossScopeConnection {
        from_node_id: String,
        to_node_id: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised during meta-execution, validation, or graph execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node '{0}' was not found")]
    UnknownNode(String),

    #[error("Connection '{0}' was not found")]
    UnknownConnection(String),

    #[error("Node '{node_id}' has an unregistered node type: '{type_name}'")]
    UnknownNodeType { node_id: String, type_name: String },

    #[error("Boundary node '{node_id}' was executed outside of a scope invocation")]
    MissingScopeContext { node_id: String },

    #[error("Node '{node_id}' owns a scope but its output boundary node is missing")]
    MissingScopeBoundary { node_id: String },

    #[error("Node '{node_id}' has an invalid form")]
    FormInvalid { node_id: String },

    #[error("Node '{node_id}' has invalid or missing inputs")]
    InputInvalid { node_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
