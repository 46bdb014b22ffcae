use std::time::SystemTime;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GraphError, StoreError};
use crate::exec::execute::GraphExecutor;
use crate::store::Store;
use crate::types::NodeTypeRegistry;
use crate::workspace::{Node, ScopePath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessState {
    Started,
    Processing,
    Successful,
    Error,
}

/// Durable record of one full graph run across all terminal nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationProcess {
    pub id: String,
    pub workspace_id: String,
    pub started_at: SystemTime,
    pub finished_at: Option<SystemTime>,
    pub state: ProcessState,
    pub total_outputs: u32,
    pub processed_outputs: u32,
}

impl CalculationProcess {
    fn new(workspace_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            workspace_id: workspace_id.to_string(),
            started_at: SystemTime::now(),
            finished_at: None,
            state: ProcessState::Started,
            total_outputs: 0,
            processed_outputs: 0,
        }
    }
}

/// One-shot run recorder: enumerates the workspace's terminal nodes, executes
/// them concurrently, and tracks progress and final state in storage.
///
/// This is the first layer that catches execution errors. A failed run is
/// reported through the process record, not an error return; partial results
/// persisted before the failure are not rolled back. The tracker never
/// retries.
pub struct CalculationTracker<'a> {
    store: &'a dyn Store,
    registry: &'a NodeTypeRegistry,
}

impl<'a> CalculationTracker<'a> {
    pub fn new(store: &'a dyn Store, registry: &'a NodeTypeRegistry) -> Self {
        Self { store, registry }
    }

    pub async fn get(&self, id: &str) -> Result<Option<CalculationProcess>, StoreError> {
        self.store.get_process(id).await
    }

    /// Run every top-level terminal node of the workspace and await the
    /// outcome. Returns the final process record.
    pub async fn start(&self, workspace_id: &str) -> Result<CalculationProcess, GraphError> {
        let mut process = CalculationProcess::new(workspace_id);
        self.store.save_process(process.clone()).await?;

        let outputs = self.output_nodes(workspace_id).await?;
        process.total_outputs = outputs.len() as u32;
        process.state = ProcessState::Processing;
        self.store.save_process(process.clone()).await?;
        info!(
            workspace_id,
            process_id = %process.id,
            total_outputs = process.total_outputs,
            "calculation started"
        );

        let executor = GraphExecutor::new(self.store, self.registry);
        let mut runs: FuturesUnordered<_> = outputs
            .iter()
            .map(|node| {
                let executor = &executor;
                async move { (node.id.clone(), executor.execute(node, None).await) }
            })
            .collect();

        while let Some((node_id, outcome)) = runs.next().await {
            match outcome {
                Ok(output) => {
                    if let Some(result) = output.result {
                        self.store.save_result(&node_id, result).await?;
                    }
                    process.processed_outputs += 1;
                    self.store.save_process(process.clone()).await?;
                }
                Err(error) => {
                    warn!(process_id = %process.id, node_id, %error, "calculation failed");
                    process.state = ProcessState::Error;
                    process.finished_at = Some(SystemTime::now());
                    self.store.save_process(process.clone()).await?;
                    return Ok(process);
                }
            }
        }

        process.state = ProcessState::Successful;
        process.finished_at = Some(SystemTime::now());
        self.store.save_process(process.clone()).await?;
        info!(process_id = %process.id, "calculation successful");
        Ok(process)
    }

    async fn output_nodes(&self, workspace_id: &str) -> Result<Vec<Node>, GraphError> {
        let top_level = ScopePath::new();
        let nodes = self.store.nodes_in_scope(workspace_id, &top_level).await?;
        Ok(nodes
            .into_iter()
            .filter(|node| {
                self.registry
                    .get(&node.node_type)
                    .is_some_and(|t| t.is_output())
            })
            .collect())
    }
}
