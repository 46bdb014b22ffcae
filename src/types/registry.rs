use std::sync::Arc;

use ahash::AHashMap;
use itertools::Itertools;

use crate::types::NodeType;
use crate::types::builtin::register_default_types;

/// Read-only lookup table from type name to node type implementation.
///
/// Built once during process start-up and passed by reference to every
/// component needing type dispatch; no mutation happens after construction.
pub struct NodeTypeRegistry {
    types: AHashMap<String, Arc<dyn NodeType>>,
}

impl NodeTypeRegistry {
    /// Registry containing the built-in catalogue.
    pub fn with_defaults() -> Self {
        let mut builder = RegistryBuilder::new();
        register_default_types(&mut builder);
        builder.build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn NodeType>> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered type names in stable order.
    pub fn names(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).sorted().collect()
    }
}

/// Mutable construction phase of a [`NodeTypeRegistry`].
pub struct RegistryBuilder {
    types: AHashMap<String, Arc<dyn NodeType>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            types: AHashMap::new(),
        }
    }

    pub fn register(&mut self, node_type: Arc<dyn NodeType>) -> &mut Self {
        self.types.insert(node_type.name().to_string(), node_type);
        self
    }

    pub fn with_defaults(mut self) -> Self {
        register_default_types(&mut self);
        self
    }

    pub fn build(self) -> NodeTypeRegistry {
        NodeTypeRegistry { types: self.types }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
