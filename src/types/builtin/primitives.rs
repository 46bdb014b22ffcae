use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::GraphError;
use crate::store::Store;
use crate::types::{ExecutionContext, NodeOutput, NodeType, absent_outputs, present_outputs};
use crate::workspace::{DataType, Form, SocketDef, SocketMetas, SocketValues, all_present};

fn form_number(form: &Form) -> Option<f64> {
    form.get("value").and_then(|raw| raw.trim().parse().ok())
}

/// Emits the raw form string as a string value.
pub struct StringInputType;

#[async_trait]
impl NodeType for StringInputType {
    fn name(&self) -> &str {
        "stringInputNode"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        vec![]
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::new("value", DataType::String)]
    }

    async fn on_meta(
        &self,
        _form: &Form,
        _inputs: &SocketMetas,
        _store: &dyn Store,
    ) -> Result<SocketMetas, GraphError> {
        Ok(present_outputs(&self.outputs()))
    }

    async fn on_execute(&self, ctx: ExecutionContext<'_>) -> Result<NodeOutput, GraphError> {
        let value = ctx.form.get("value").cloned().unwrap_or_default();
        let mut outputs = SocketValues::default();
        outputs.insert("value".to_string(), Value::String(value));
        Ok(NodeOutput::from_outputs(outputs))
    }
}

/// Parses the form string as a number.
pub struct NumberInputType;

#[async_trait]
impl NodeType for NumberInputType {
    fn name(&self) -> &str {
        "numberInputNode"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        vec![]
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::new("value", DataType::Number)]
    }

    fn is_form_valid(&self, form: &Form) -> bool {
        form_number(form).is_some()
    }

    async fn on_meta(
        &self,
        form: &Form,
        _inputs: &SocketMetas,
        _store: &dyn Store,
    ) -> Result<SocketMetas, GraphError> {
        if form_number(form).is_some() {
            Ok(present_outputs(&self.outputs()))
        } else {
            Ok(absent_outputs(&self.outputs()))
        }
    }

    async fn on_execute(&self, ctx: ExecutionContext<'_>) -> Result<NodeOutput, GraphError> {
        let number = form_number(ctx.form).ok_or_else(|| GraphError::FormInvalid {
            node_id: ctx.node_id.to_string(),
        })?;
        let mut outputs = SocketValues::default();
        outputs.insert("value".to_string(), json!(number));
        Ok(NodeOutput::from_outputs(outputs))
    }
}

/// Adds its two number inputs.
pub struct SumType;

#[async_trait]
impl NodeType for SumType {
    fn name(&self) -> &str {
        "sumNode"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        vec![
            SocketDef::new("a", DataType::Number),
            SocketDef::new("b", DataType::Number),
        ]
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::new("sum", DataType::Number)]
    }

    async fn is_input_valid(
        &self,
        inputs: &SocketValues,
        _store: &dyn Store,
    ) -> Result<bool, GraphError> {
        Ok(["a", "b"]
            .iter()
            .all(|name| inputs.get(*name).is_some_and(Value::is_number)))
    }

    async fn on_meta(
        &self,
        _form: &Form,
        inputs: &SocketMetas,
        _store: &dyn Store,
    ) -> Result<SocketMetas, GraphError> {
        if all_present(&self.inputs(), inputs) {
            Ok(present_outputs(&self.outputs()))
        } else {
            Ok(absent_outputs(&self.outputs()))
        }
    }

    async fn on_execute(&self, ctx: ExecutionContext<'_>) -> Result<NodeOutput, GraphError> {
        let operand = |name: &str| {
            ctx.inputs
                .get(name)
                .and_then(Value::as_f64)
                .ok_or_else(|| GraphError::InputInvalid {
                    node_id: ctx.node_id.to_string(),
                })
        };
        let sum = operand("a")? + operand("b")?;
        let mut outputs = SocketValues::default();
        outputs.insert("sum".to_string(), json!(sum));
        Ok(NodeOutput::from_outputs(outputs))
    }
}

macro_rules! define_value_output_type {
    ($struct_name:ident, $node_type:expr, $data_type:expr) => {
        /// Terminal node publishing its single input as a user-visible result.
        pub struct $struct_name;

        #[async_trait]
        impl NodeType for $struct_name {
            fn name(&self) -> &str {
                $node_type
            }

            fn inputs(&self) -> Vec<SocketDef> {
                vec![SocketDef::new("value", $data_type)]
            }

            fn outputs(&self) -> Vec<SocketDef> {
                vec![]
            }

            fn is_output(&self) -> bool {
                true
            }

            async fn on_meta(
                &self,
                _form: &Form,
                _inputs: &SocketMetas,
                _store: &dyn Store,
            ) -> Result<SocketMetas, GraphError> {
                Ok(SocketMetas::default())
            }

            async fn on_execute(
                &self,
                ctx: ExecutionContext<'_>,
            ) -> Result<NodeOutput, GraphError> {
                let value =
                    ctx.inputs
                        .get("value")
                        .cloned()
                        .ok_or_else(|| GraphError::InputInvalid {
                            node_id: ctx.node_id.to_string(),
                        })?;
                Ok(NodeOutput::with_result(json!({ "value": value })))
            }
        }
    };
}

define_value_output_type!(StringOutputType, "stringOutputNode", DataType::String);
define_value_output_type!(NumberOutputType, "numberOutputNode", DataType::Number);
