use ahash::AHashMap;
use async_trait::async_trait;
use futures::future::{BoxFuture, try_join_all};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::GraphError;
use crate::exec::meta::MetaResolver;
use crate::exec::validate::validate_execution;
use crate::store::Store;
use crate::types::{ExecutionContext, NodeOutput, NodeTypeRegistry, ScopeCall};
use crate::workspace::{Node, SCOPE_INPUT_TYPE, SCOPE_OUTPUT_TYPE, SocketValues};

/// The real evaluator: resolves a node's inputs by recursing through its
/// bound connections, gates execution through the validation passes, and
/// drives scope invocation for higher-order nodes.
///
/// Evaluation is tree-recursive and input resolution fans out concurrently.
/// There is no memoization by default: a diamond-shaped dependency re-executes
/// the shared upstream source once per consumer, matching the visual editor's
/// semantics. [`GraphExecutor::with_memoization`] opts into a per-run cache
/// keyed by node id for top-level resolutions.
pub struct GraphExecutor<'a> {
    store: &'a dyn Store,
    registry: &'a NodeTypeRegistry,
    memo: Option<Mutex<AHashMap<String, NodeOutput>>>,
}

impl<'a> GraphExecutor<'a> {
    pub fn new(store: &'a dyn Store, registry: &'a NodeTypeRegistry) -> Self {
        Self {
            store,
            registry,
            memo: None,
        }
    }

    pub fn with_memoization(store: &'a dyn Store, registry: &'a NodeTypeRegistry) -> Self {
        Self {
            store,
            registry,
            memo: Some(Mutex::new(AHashMap::new())),
        }
    }

    /// Ad-hoc execution of a single node by id, outside any tracked process.
    pub async fn execute_by_id(&self, node_id: &str) -> Result<NodeOutput, GraphError> {
        let node = self
            .store
            .get_node(node_id)
            .await?
            .ok_or_else(|| GraphError::UnknownNode(node_id.to_string()))?;
        self.execute(&node, None).await
    }

    /// Execute one node, recursively resolving its inputs. `scope_values` is
    /// the active scope invocation's boundary binding; only the innermost
    /// invocation's values are visible (single-level closure semantics).
    pub fn execute<'b>(
        &'b self,
        node: &'b Node,
        scope_values: Option<&'b SocketValues>,
    ) -> BoxFuture<'b, Result<NodeOutput, GraphError>> {
        Box::pin(async move {
            debug!(node_id = %node.id, node_type = %node.node_type, "executing node");

            if node.node_type == SCOPE_INPUT_TYPE {
                return match scope_values {
                    Some(values) => Ok(NodeOutput::from_outputs(values.clone())),
                    None => Err(GraphError::MissingScopeContext {
                        node_id: node.id.clone(),
                    }),
                };
            }

            // Scope-bound resolutions vary per iteration binding, so only
            // top-level results are memoizable.
            if scope_values.is_none()
                && let Some(memo) = &self.memo
                && let Some(cached) = memo.lock().await.get(&node.id)
            {
                return Ok(cached.clone());
            }

            let inputs = self.resolve_inputs(node, scope_values).await?;

            if node.node_type == SCOPE_OUTPUT_TYPE {
                return Ok(NodeOutput::from_outputs(inputs));
            }

            let resolver = MetaResolver::new(self.store, self.registry);
            let node_type = resolver.lookup_type(node)?;
            validate_execution(&resolver, node, node_type, &inputs, self.store).await?;

            let ctx = ExecutionContext::new(&node.id, &node.form, &inputs, self.store);
            let output = if node_type.scope().is_some() {
                let boundary = self.find_scope_output(node).await?;
                let runner = ScopeRunner {
                    executor: self,
                    boundary,
                };
                node_type.on_execute(ctx.with_scope(&runner)).await?
            } else {
                node_type.on_execute(ctx).await?
            };

            if scope_values.is_none()
                && let Some(memo) = &self.memo
            {
                memo.lock().await.insert(node.id.clone(), output.clone());
            }
            Ok(output)
        })
    }

    async fn resolve_inputs(
        &self,
        node: &Node,
        scope_values: Option<&SocketValues>,
    ) -> Result<SocketValues, GraphError> {
        let resolutions = node.input_bindings.iter().map(|binding| async move {
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
            let output = self.execute(&source, scope_values).await?;
            let value = output.outputs.get(&connection.from.socket_name).cloned();
            Ok::<_, GraphError>((binding.socket_name.clone(), value))
        });
        Ok(try_join_all(resolutions)
            .await?
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect())
    }

    async fn find_scope_output(&self, node: &Node) -> Result<Node, GraphError> {
        let children = self
            .store
            .nodes_in_scope(&node.workspace_id, &node.owned_scope())
            .await?;
        children
            .into_iter()
            .find(|child| child.node_type == SCOPE_OUTPUT_TYPE)
            .ok_or_else(|| GraphError::MissingScopeBoundary {
                node_id: node.id.clone(),
            })
    }
}

/// Plumbing handed to a scope-owning node type: one call runs the nested
/// sub-graph once, with an independent, correctly-scoped boundary binding.
/// The enclosing invocation's binding is deliberately not threaded through:
/// scope visibility is single-level.
struct ScopeRunner<'e> {
    executor: &'e GraphExecutor<'e>,
    boundary: Node,
}

#[async_trait]
impl ScopeCall for ScopeRunner<'_> {
    async fn invoke(&self, values: SocketValues) -> Result<SocketValues, GraphError> {
        let output = self.executor.execute(&self.boundary, Some(&values)).await?;
        Ok(output.outputs)
    }
}
