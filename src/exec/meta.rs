use futures::future::{BoxFuture, try_join_all};

use crate::error::GraphError;
use crate::store::Store;
use crate::types::{NodeType, NodeTypeRegistry, present_outputs};
use crate::workspace::{
    Node, SCOPE_INPUT_TYPE, SCOPE_OUTPUT_TYPE, SocketBinding, SocketDef, SocketMeta, SocketMetas,
};

/// The meta-execution engine: walks the graph backward from a node and infers,
/// without side effects, what each socket's output presence/shape would be.
///
/// Safe to call repeatedly and concurrently; results depend only on the
/// graph's static structure and the current form/storage-read state, never on
/// evaluation order. Absence is reported in-band as `present: false` — only
/// genuinely unexpected conditions (unknown node, unknown connection) error.
pub struct MetaResolver<'a> {
    store: &'a dyn Store,
    registry: &'a NodeTypeRegistry,
}

impl<'a> MetaResolver<'a> {
    pub fn new(store: &'a dyn Store, registry: &'a NodeTypeRegistry) -> Self {
        Self { store, registry }
    }

    pub(crate) fn lookup_type(&self, node: &Node) -> Result<&dyn NodeType, GraphError> {
        self.registry
            .get(&node.node_type)
            .map(|t| t.as_ref())
            .ok_or_else(|| GraphError::UnknownNodeType {
                node_id: node.id.clone(),
                type_name: node.node_type.clone(),
            })
    }

    /// Output metas of a node.
    pub fn meta_of<'b>(&'b self, node: &'b Node) -> BoxFuture<'b, Result<SocketMetas, GraphError>> {
        Box::pin(async move {
            match node.node_type.as_str() {
                // Base case of the recursion: the metas a sub-scope's input
                // boundary exposes are declared by the scope's owning node.
                SCOPE_INPUT_TYPE => self.scope_input_metas(node).await,
                // The output boundary exposes the socket set the owning node
                // declares for it; declared sockets without a bound
                // connection resolve to absent.
                SCOPE_OUTPUT_TYPE => self.scope_output_metas(node).await,
                _ => {
                    let node_type = self.lookup_type(node)?;
                    let inputs = self.meta_inputs(node).await?;
                    node_type.on_meta(&node.form, &inputs, self.store).await
                }
            }
        })
    }

    /// Metas of every declared input socket of a node; unbound sockets map to
    /// `present: false`.
    pub async fn meta_inputs(&self, node: &Node) -> Result<SocketMetas, GraphError> {
        if node.node_type == SCOPE_OUTPUT_TYPE {
            return self.resolve_bindings(&node.input_bindings).await;
        }
        if node.node_type == SCOPE_INPUT_TYPE {
            return Ok(SocketMetas::default());
        }
        let node_type = self.lookup_type(node)?;
        let resolutions = node_type.inputs().into_iter().map(|def| async move {
            let meta = match node.input_binding(&def.name) {
                Some(binding) => self.meta_through(binding).await?,
                None => SocketMeta::absent(),
            };
            Ok::<_, GraphError>((def.name, meta))
        });
        Ok(try_join_all(resolutions).await?.into_iter().collect())
    }

    /// Follows bound connections only, keyed by the bound socket names. Used
    /// for boundary nodes whose socket set is dynamic.
    async fn resolve_bindings(&self, bindings: &[SocketBinding]) -> Result<SocketMetas, GraphError> {
        let resolutions = bindings.iter().map(|binding| async move {
            let meta = self.meta_through(binding).await?;
            Ok::<_, GraphError>((binding.socket_name.clone(), meta))
        });
        Ok(try_join_all(resolutions).await?.into_iter().collect())
    }

    /// Meta of the named output on the far side of one bound connection.
    async fn meta_through(&self, binding: &SocketBinding) -> Result<SocketMeta, GraphError> {
        let connection = self
            .store
            .get_connection(&binding.connection_id)
            .await?
            .ok_or_else(|| GraphError::UnknownConnection(binding.connection_id.clone()))?;
        let source = self
            .store
            .get_node(&connection.from.node_id)
            .await?
            .ok_or_else(|| GraphError::UnknownNode(connection.from.node_id.clone()))?;
        let outputs = self.meta_of(&source).await?;
        Ok(outputs
            .get(&connection.from.socket_name)
            .cloned()
            .unwrap_or_else(SocketMeta::absent))
    }

    /// The socket sets the scope owner declares for its two boundary nodes.
    async fn scope_declarations(
        &self,
        node: &Node,
    ) -> Result<(Vec<SocketDef>, Vec<SocketDef>), GraphError> {
        let owner_id = node
            .scope_owner()
            .ok_or_else(|| GraphError::MissingScopeContext {
                node_id: node.id.clone(),
            })?;
        let owner = self
            .store
            .get_node(owner_id)
            .await?
            .ok_or_else(|| GraphError::UnknownNode(owner_id.to_string()))?;
        let owner_type = self.lookup_type(&owner)?;
        let scoped = owner_type
            .scope()
            .ok_or_else(|| GraphError::MissingScopeBoundary {
                node_id: owner.id.clone(),
            })?;
        let owner_inputs = self.meta_inputs(&owner).await?;
        let input_defs = scoped
            .scope_inputs(&owner_inputs, &owner.form, self.store)
            .await?;
        let output_defs = scoped
            .scope_outputs(&owner_inputs, &input_defs, &owner.form, self.store)
            .await?;
        Ok((input_defs, output_defs))
    }

    async fn scope_input_metas(&self, node: &Node) -> Result<SocketMetas, GraphError> {
        let (input_defs, _) = self.scope_declarations(node).await?;
        Ok(present_outputs(&input_defs))
    }

    async fn scope_output_metas(&self, node: &Node) -> Result<SocketMetas, GraphError> {
        let (_, output_defs) = self.scope_declarations(node).await?;
        let resolutions = output_defs.into_iter().map(|def| async move {
            let meta = match node.input_binding(&def.name) {
                Some(binding) => self.meta_through(binding).await?,
                None => SocketMeta::absent(),
            };
            Ok::<_, GraphError>((def.name, meta))
        });
        Ok(try_join_all(resolutions).await?.into_iter().collect())
    }
}
