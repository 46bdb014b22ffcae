use async_trait::async_trait;
use serde_json::Value;

use crate::error::GraphError;
use crate::store::Store;
use crate::workspace::{Form, SocketValues};

/// Everything a node type sees while executing one node instance.
pub struct ExecutionContext<'a> {
    pub node_id: &'a str,
    pub form: &'a Form,
    pub inputs: &'a SocketValues,
    pub store: &'a dyn Store,
    scope: Option<&'a dyn ScopeCall>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        node_id: &'a str,
        form: &'a Form,
        inputs: &'a SocketValues,
        store: &'a dyn Store,
    ) -> Self {
        Self {
            node_id,
            form,
            inputs,
            store,
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: &'a dyn ScopeCall) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Invoke the owned sub-graph once with the given boundary values and
    /// collect what arrives at the scope's output boundary node.
    ///
    /// The engine wires this capability only for scope-owning node types; how
    /// often and with which values it is called is the type's iteration
    /// policy.
    pub async fn invoke_scope(&self, values: SocketValues) -> Result<SocketValues, GraphError> {
        match self.scope {
            Some(scope) => scope.invoke(values).await,
            None => Err(GraphError::MissingScopeBoundary {
                node_id: self.node_id.to_string(),
            }),
        }
    }
}

/// Engine-provided plumbing that runs one scope iteration.
#[async_trait]
pub trait ScopeCall: Send + Sync {
    async fn invoke(&self, values: SocketValues) -> Result<SocketValues, GraphError>;
}

/// What executing one node produced: values per output socket, and for
/// terminal types a user-visible artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOutput {
    pub outputs: SocketValues,
    pub result: Option<Value>,
}

impl NodeOutput {
    pub fn from_outputs(outputs: SocketValues) -> Self {
        Self {
            outputs,
            result: None,
        }
    }

    pub fn with_result(result: Value) -> Self {
        Self {
            outputs: SocketValues::default(),
            result: Some(result),
        }
    }
}
