use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workspace::ScopePath;

/// Address of one socket on one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketRef {
    pub node_id: String,
    pub socket_name: String,
}

impl SocketRef {
    pub fn new(node_id: impl Into<String>, socket_name: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            socket_name: socket_name.into(),
        }
    }
}

impl fmt::Display for SocketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node_id, self.socket_name)
    }
}

/// A directed edge binding one node's output socket to another's input socket.
///
/// A `to` socket carries at most one incoming connection; `from` may fan out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub from: SocketRef,
    pub to: SocketRef,
    pub workspace_id: String,
    pub scope_path: ScopePath,
}
