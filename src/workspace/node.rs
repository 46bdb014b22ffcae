use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Reserved type name of the node marking the input boundary of a sub-scope.
pub const SCOPE_INPUT_TYPE: &str = "scopeInputNode";
/// Reserved type name of the node marking the output boundary of a sub-scope.
pub const SCOPE_OUTPUT_TYPE: &str = "scopeOutputNode";

/// Ordered list of ancestor node ids identifying the nested sub-graph a node
/// lives in. The empty path is the top level of a workspace.
pub type ScopePath = Vec<String>;

/// Raw form values as edited in the workspace UI, keyed by field name.
/// Node types are responsible for parsing them.
pub type Form = AHashMap<String, String>;

/// A named container owning a set of nodes and connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

/// Denormalized back-reference from a node's socket to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketBinding {
    pub socket_name: String,
    pub connection_id: String,
}

/// A single unit of computation placed in a workspace graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub node_type: String,
    pub workspace_id: String,
    pub scope_path: ScopePath,
    pub position: (f64, f64),
    pub form: Form,
    pub input_bindings: Vec<SocketBinding>,
    pub output_bindings: Vec<SocketBinding>,
}

impl Node {
    pub fn new(
        node_type: impl Into<String>,
        workspace_id: impl Into<String>,
        scope_path: ScopePath,
        position: (f64, f64),
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            node_type: node_type.into(),
            workspace_id: workspace_id.into(),
            scope_path,
            position,
            form: Form::default(),
            input_bindings: Vec::new(),
            output_bindings: Vec::new(),
        }
    }

    /// Whether this node is one of the two reserved scope boundary nodes.
    pub fn is_boundary(&self) -> bool {
        self.node_type == SCOPE_INPUT_TYPE || self.node_type == SCOPE_OUTPUT_TYPE
    }

    /// The scope path of the sub-graph this node would own, were its type a
    /// scope-owning one.
    pub fn owned_scope(&self) -> ScopePath {
        let mut path = self.scope_path.clone();
        path.push(self.id.clone());
        path
    }

    /// Id of the node owning the scope this node lives in, if any.
    pub fn scope_owner(&self) -> Option<&str> {
        self.scope_path.last().map(String::as_str)
    }

    pub fn input_binding(&self, socket_name: &str) -> Option<&SocketBinding> {
        self.input_bindings
            .iter()
            .find(|b| b.socket_name == socket_name)
    }

    pub fn with_form(mut self, key: &str, value: &str) -> Self {
        self.form.insert(key.to_string(), value.to_string());
        self
    }
}
