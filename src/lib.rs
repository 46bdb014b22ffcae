//! # Kairo - Dataflow Workspace Execution Engine
//!
//! **Kairo** evaluates directed graphs of typed processing nodes
//! ("workspaces") whose connections carry values between named sockets. It is
//! a small asynchronous interpreter for a visual dataflow language: terminal
//! nodes are resolved by recursing backward through their connections, node
//! behavior is dispatched through an immutable type registry, and a node may
//! own a nested sub-graph that the engine invokes for it like a function,
//! once per iteration the node decides on.
//!
//! ## Core Workflow
//!
//! 1. **Register node types**: build a [`NodeTypeRegistry`](types::NodeTypeRegistry)
//!    once at startup, containing the built-in catalogue and any custom
//!    [`NodeType`](types::NodeType) implementations.
//! 2. **Edit the graph**: create nodes and connections through the
//!    [`WorkspaceManager`](workspace::WorkspaceManager), which enforces the
//!    fan-in, same-scope, and acyclicity invariants on every mutation.
//! 3. **Inspect**: the [`MetaResolver`](exec::MetaResolver) projects socket
//!    presence and shape without executing anything, for editor feedback.
//! 4. **Execute**: the [`GraphExecutor`](exec::GraphExecutor) runs single
//!    nodes ad hoc; the [`CalculationTracker`](exec::CalculationTracker) runs
//!    all terminal nodes of a workspace and records progress durably.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kairo::prelude::*;
//!
//! # async fn run_example() -> Result<()> {
//! let store = MemoryStore::new();
//! let registry = NodeTypeRegistry::with_defaults();
//! let manager = WorkspaceManager::new(&store, &registry);
//!
//! let input = manager
//!     .create_node("ws", "stringInputNode", vec![], (0.0, 0.0))
//!     .await?;
//! let output = manager
//!     .create_node("ws", "stringOutputNode", vec![], (200.0, 0.0))
//!     .await?;
//! manager
//!     .create_connection(
//!         SocketRef::new(&input.id, "value"),
//!         SocketRef::new(&output.id, "value"),
//!     )
//!     .await?;
//!
//! let mut edited = store.get_node(&input.id).await?.unwrap();
//! edited.form.insert("value".to_string(), "hello".to_string());
//! store.save_node(edited).await?;
//!
//! let executor = GraphExecutor::new(&store, &registry);
//! let out = executor.execute_by_id(&output.id).await?;
//! println!("{:?}", out.result);
//! # Ok(())
//! # }
//! ```
//!
//! Scope-owning ("higher-order") node types receive an
//! [`ExecutionContext::invoke_scope`](types::ExecutionContext::invoke_scope)
//! capability and decide their own iteration policy; the engine guarantees
//! each invocation sees an independent binding of the scope's input boundary.

pub mod error;
pub mod exec;
pub mod prelude;
pub mod store;
pub mod types;
pub mod workspace;
