use async_trait::async_trait;

use crate::error::GraphError;
use crate::store::Store;
use crate::workspace::{Form, SocketDef, SocketMeta, SocketMetas, SocketValues};

pub mod builtin;
pub mod context;
pub mod registry;

pub use context::{ExecutionContext, NodeOutput, ScopeCall};
pub use registry::NodeTypeRegistry;

/// Behavioral contract every node type satisfies.
///
/// A node type is a named, versionless, immutable descriptor: it declares the
/// sockets a node of this type exposes and implements the two evaluation
/// phases — `on_meta` (pure presence/shape projection) and `on_execute` (the
/// real computation). Types are registered once at startup in a
/// [`NodeTypeRegistry`] and dispatched by name.
#[async_trait]
pub trait NodeType: Send + Sync {
    /// Registry key, e.g. `"sumNode"`.
    fn name(&self) -> &str;

    fn inputs(&self) -> Vec<SocketDef>;

    fn outputs(&self) -> Vec<SocketDef>;

    /// Terminal node types produce a user-visible `result` and are the entry
    /// points of a calculation run.
    fn is_output(&self) -> bool {
        false
    }

    /// Structural check of the raw form values.
    fn is_form_valid(&self, _form: &Form) -> bool {
        true
    }

    /// Value-level check of the resolved inputs, beyond presence. Referenced
    /// external entities (e.g. a dataset id) must currently exist.
    async fn is_input_valid(
        &self,
        _inputs: &SocketValues,
        _store: &dyn Store,
    ) -> Result<bool, GraphError> {
        Ok(true)
    }

    /// Project output presence/shape from input metas without executing.
    /// Must be consistent with `on_execute` and must not write to storage.
    async fn on_meta(
        &self,
        form: &Form,
        inputs: &SocketMetas,
        store: &dyn Store,
    ) -> Result<SocketMetas, GraphError>;

    /// The real computation. May suspend on storage I/O; for scope-owning
    /// types, `ctx.invoke_scope` calls into the nested sub-graph.
    async fn on_execute(&self, ctx: ExecutionContext<'_>) -> Result<NodeOutput, GraphError>;

    /// Explicit capability query: `Some` for types owning a nested sub-scope.
    fn scope(&self) -> Option<&dyn ScopedNodeType> {
        None
    }
}

/// Capability of node types owning a nested sub-graph ("higher-order" nodes).
///
/// The declared socket sets may depend on resolved input metas, which is how
/// data-dependent sockets (one per column of a dataset known only at
/// meta-execution time) appear inside a sub-scope.
#[async_trait]
pub trait ScopedNodeType: Send + Sync {
    /// Sockets the scope's input boundary node exposes downstream.
    async fn scope_inputs(
        &self,
        input_metas: &SocketMetas,
        form: &Form,
        store: &dyn Store,
    ) -> Result<Vec<SocketDef>, GraphError>;

    /// Sockets the scope's output boundary node exposes upstream. Defaults to
    /// mirroring the scope inputs.
    async fn scope_outputs(
        &self,
        _input_metas: &SocketMetas,
        scope_input_defs: &[SocketDef],
        _form: &Form,
        _store: &dyn Store,
    ) -> Result<Vec<SocketDef>, GraphError> {
        Ok(scope_input_defs.to_vec())
    }
}

/// Convenience: mark every declared output as present with empty content.
pub fn present_outputs(defs: &[SocketDef]) -> SocketMetas {
    defs.iter()
        .map(|def| (def.name.clone(), SocketMeta::present()))
        .collect()
}

/// Convenience: mark every declared output as absent.
pub fn absent_outputs(defs: &[SocketDef]) -> SocketMetas {
    defs.iter()
        .map(|def| (def.name.clone(), SocketMeta::absent()))
        .collect()
}
