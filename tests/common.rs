//! Common test utilities for building workspaces against the in-memory store.
use kairo::prelude::*;

/// One workspace wired to a fresh in-memory store and the default registry.
pub struct TestBench {
    pub store: MemoryStore,
    pub registry: NodeTypeRegistry,
    pub workspace_id: String,
}

#[allow(dead_code)]
impl TestBench {
    pub async fn new() -> Self {
        Self::with_registry(NodeTypeRegistry::with_defaults()).await
    }

    pub async fn with_registry(registry: NodeTypeRegistry) -> Self {
        let store = MemoryStore::new();
        let workspace = Workspace {
            id: "ws".to_string(),
            name: "Test workspace".to_string(),
        };
        store
            .save_workspace(workspace.clone())
            .await
            .expect("workspace save");
        Self {
            store,
            registry,
            workspace_id: workspace.id,
        }
    }

    pub fn manager(&self) -> WorkspaceManager<'_> {
        WorkspaceManager::new(&self.store, &self.registry)
    }

    pub fn executor(&self) -> GraphExecutor<'_> {
        GraphExecutor::new(&self.store, &self.registry)
    }

    pub fn resolver(&self) -> MetaResolver<'_> {
        MetaResolver::new(&self.store, &self.registry)
    }

    /// Create a node at the top level and fill its form.
    pub async fn node(&self, type_name: &str, form: &[(&str, &str)]) -> Node {
        self.scoped_node(type_name, ScopePath::new(), form).await
    }

    pub async fn scoped_node(
        &self,
        type_name: &str,
        scope_path: ScopePath,
        form: &[(&str, &str)],
    ) -> Node {
        let node = self
            .manager()
            .create_node(&self.workspace_id, type_name, scope_path, (0.0, 0.0))
            .await
            .expect("node creation");
        if form.is_empty() {
            return node;
        }
        let mut stored = self.reload(&node.id).await;
        for (key, value) in form {
            stored.form.insert(key.to_string(), value.to_string());
        }
        self.store.save_node(stored.clone()).await.expect("form save");
        stored
    }

    pub async fn connect(
        &self,
        from: &Node,
        from_socket: &str,
        to: &Node,
        to_socket: &str,
    ) -> Connection {
        self.manager()
            .create_connection(
                SocketRef::new(&from.id, from_socket),
                SocketRef::new(&to.id, to_socket),
            )
            .await
            .expect("connection creation")
    }

    /// Latest persisted state of a node.
    pub async fn reload(&self, id: &str) -> Node {
        self.store
            .get_node(id)
            .await
            .expect("node lookup")
            .expect("node exists")
    }

    /// Nodes of a given type inside the scope a node owns.
    pub async fn scope_child(&self, owner: &Node, type_name: &str) -> Node {
        self.store
            .nodes_in_scope(&self.workspace_id, &owner.owned_scope())
            .await
            .expect("scope lookup")
            .into_iter()
            .find(|n| n.node_type == type_name)
            .expect("scope child exists")
    }

    /// Create a dataset of string fields and fill it with entries.
    pub async fn string_dataset(
        &self,
        name: &str,
        fields: &[&str],
        entries: &[&[(&str, &str)]],
    ) -> Dataset {
        let schema = fields
            .iter()
            .map(|f| ValueSchema::new(*f, DataType::String))
            .collect();
        let dataset = self
            .store
            .create_dataset(name, schema)
            .await
            .expect("dataset creation");
        for entry in entries {
            let values: SocketValues = entry
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::json!(v)))
                .collect();
            self.store
                .create_entry(&dataset.id, values)
                .await
                .expect("entry creation");
        }
        dataset
    }
}
