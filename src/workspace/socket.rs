use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The payload kind a socket carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    String,
    Number,
    Boolean,
    Dataset,
    Entry,
    Any,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::String => "String",
            DataType::Number => "Number",
            DataType::Boolean => "Boolean",
            DataType::Dataset => "Dataset",
            DataType::Entry => "Entry",
            DataType::Any => "Any",
        };
        write!(f, "{}", name)
    }
}

/// Static declaration of one named socket on a node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketDef {
    pub name: String,
    pub data_type: DataType,
}

impl SocketDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Result of meta-executing one socket: whether a value would be present, and
/// an opaque per-type shape description (e.g. a dataset schema).
///
/// Metas are computed on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketMeta {
    pub present: bool,
    pub content: Value,
}

impl SocketMeta {
    pub fn absent() -> Self {
        Self {
            present: false,
            content: Value::Null,
        }
    }

    pub fn present() -> Self {
        Self {
            present: true,
            content: Value::Null,
        }
    }

    pub fn present_with(content: Value) -> Self {
        Self {
            present: true,
            content,
        }
    }
}

/// Resolved runtime values, keyed by socket name.
pub type SocketValues = AHashMap<String, Value>;

/// Resolved meta descriptors, keyed by socket name.
pub type SocketMetas = AHashMap<String, SocketMeta>;

/// True when every declared socket resolved to a present meta.
pub fn all_present(defs: &[SocketDef], metas: &SocketMetas) -> bool {
    defs.iter()
        .all(|def| metas.get(&def.name).is_some_and(|m| m.present))
}
