use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::GraphError;
use crate::store::{Store, ValueSchema};
use crate::types::{ExecutionContext, NodeOutput, NodeType, ScopedNodeType, absent_outputs};
use crate::workspace::{DataType, Form, SocketDef, SocketMeta, SocketMetas, SocketValues};

fn schema_content(schema: &[ValueSchema]) -> Value {
    json!({ "schema": schema })
}

fn schema_from_content(content: &Value) -> Vec<ValueSchema> {
    content
        .get("schema")
        .and_then(|raw| serde_json::from_value(raw.clone()).ok())
        .unwrap_or_default()
}

fn dataset_id_value(inputs: &SocketValues, node_id: &str) -> Result<String, GraphError> {
    inputs
        .get("dataset")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GraphError::InputInvalid {
            node_id: node_id.to_string(),
        })
}

/// References an existing dataset by id. Its meta carries the dataset's
/// schema so downstream scope-owning nodes can declare per-column sockets.
pub struct DatasetInputType;

#[async_trait]
impl NodeType for DatasetInputType {
    fn name(&self) -> &str {
        "datasetInputNode"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        vec![]
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::new("dataset", DataType::Dataset)]
    }

    fn is_form_valid(&self, form: &Form) -> bool {
        form.get("dataset").is_some_and(|id| !id.is_empty())
    }

    async fn on_meta(
        &self,
        form: &Form,
        _inputs: &SocketMetas,
        store: &dyn Store,
    ) -> Result<SocketMetas, GraphError> {
        let mut metas = SocketMetas::default();
        let dataset = match form.get("dataset") {
            Some(id) => store.get_dataset(id).await?,
            None => None,
        };
        let meta = match dataset {
            Some(dataset) => SocketMeta::present_with(schema_content(&dataset.schema)),
            None => SocketMeta::absent(),
        };
        metas.insert("dataset".to_string(), meta);
        Ok(metas)
    }

    async fn on_execute(&self, ctx: ExecutionContext<'_>) -> Result<NodeOutput, GraphError> {
        let id = ctx
            .form
            .get("dataset")
            .cloned()
            .ok_or_else(|| GraphError::FormInvalid {
                node_id: ctx.node_id.to_string(),
            })?;
        // Absence of the referenced dataset is a validity failure, not a crash.
        if ctx.store.get_dataset(&id).await?.is_none() {
            return Err(GraphError::InputInvalid {
                node_id: ctx.node_id.to_string(),
            });
        }
        let mut outputs = SocketValues::default();
        outputs.insert("dataset".to_string(), Value::String(id));
        Ok(NodeOutput::from_outputs(outputs))
    }
}

/// Terminal node publishing a dataset reference as its result.
pub struct DatasetOutputType;

#[async_trait]
impl NodeType for DatasetOutputType {
    fn name(&self) -> &str {
        "datasetOutputNode"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::new("dataset", DataType::Dataset)]
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![]
    }

    fn is_output(&self) -> bool {
        true
    }

    async fn is_input_valid(
        &self,
        inputs: &SocketValues,
        store: &dyn Store,
    ) -> Result<bool, GraphError> {
        match inputs.get("dataset").and_then(Value::as_str) {
            Some(id) => Ok(store.get_dataset(id).await?.is_some()),
            None => Ok(false),
        }
    }

    async fn on_meta(
        &self,
        _form: &Form,
        _inputs: &SocketMetas,
        _store: &dyn Store,
    ) -> Result<SocketMetas, GraphError> {
        Ok(SocketMetas::default())
    }

    async fn on_execute(&self, ctx: ExecutionContext<'_>) -> Result<NodeOutput, GraphError> {
        let id = dataset_id_value(ctx.inputs, ctx.node_id)?;
        Ok(NodeOutput::with_result(json!({ "dataset": id })))
    }
}

/// Higher-order per-entry mapping node: invokes its sub-scope once per entry
/// of the input dataset and writes whatever arrives at the scope's output
/// boundary into a freshly created dataset.
pub struct EditEntriesType;

#[async_trait]
impl NodeType for EditEntriesType {
    fn name(&self) -> &str {
        "editEntriesNode"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::new("dataset", DataType::Dataset)]
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::new("dataset", DataType::Dataset)]
    }

    async fn is_input_valid(
        &self,
        inputs: &SocketValues,
        store: &dyn Store,
    ) -> Result<bool, GraphError> {
        match inputs.get("dataset").and_then(Value::as_str) {
            Some(id) => Ok(store.get_dataset(id).await?.is_some()),
            None => Ok(false),
        }
    }

    async fn on_meta(
        &self,
        _form: &Form,
        inputs: &SocketMetas,
        _store: &dyn Store,
    ) -> Result<SocketMetas, GraphError> {
        let mut metas = SocketMetas::default();
        match inputs.get("dataset") {
            Some(meta) if meta.present => {
                metas.insert("dataset".to_string(), meta.clone());
            }
            _ => return Ok(absent_outputs(&self.outputs())),
        }
        Ok(metas)
    }

    async fn on_execute(&self, ctx: ExecutionContext<'_>) -> Result<NodeOutput, GraphError> {
        let source_id = dataset_id_value(ctx.inputs, ctx.node_id)?;
        let source = ctx
            .store
            .get_dataset(&source_id)
            .await?
            .ok_or_else(|| GraphError::InputInvalid {
                node_id: ctx.node_id.to_string(),
            })?;

        let target = ctx
            .store
            .create_dataset(&format!("{} (edited)", source.name), source.schema.clone())
            .await?;
        let target_id = target.id.clone();

        let store = ctx.store;
        let ctx_ref = &ctx;
        let target_ref = target_id.as_str();
        let mut visitor = move |entry: crate::store::Entry| {
            async move {
                let produced = ctx_ref.invoke_scope(entry.values).await?;
                store.create_entry(target_ref, produced).await?;
                Ok::<_, GraphError>(())
            }
            .boxed()
        };
        let progress = |done: u64, total: u64| {
            debug!(done, total, "edit entries progress");
        };
        let visited = store
            .for_each_entry(&source_id, &mut visitor, Some(&progress))
            .await?;
        debug!(dataset = %source_id, visited, "edit entries finished");

        let mut outputs = SocketValues::default();
        outputs.insert("dataset".to_string(), Value::String(target_id));
        Ok(NodeOutput::from_outputs(outputs))
    }

    fn scope(&self) -> Option<&dyn ScopedNodeType> {
        Some(self)
    }
}

#[async_trait]
impl ScopedNodeType for EditEntriesType {
    async fn scope_inputs(
        &self,
        input_metas: &SocketMetas,
        _form: &Form,
        _store: &dyn Store,
    ) -> Result<Vec<SocketDef>, GraphError> {
        let schema = input_metas
            .get("dataset")
            .filter(|meta| meta.present)
            .map(|meta| schema_from_content(&meta.content))
            .unwrap_or_default();
        Ok(schema
            .into_iter()
            .map(|field| SocketDef::new(field.name, field.data_type))
            .collect())
    }
}
