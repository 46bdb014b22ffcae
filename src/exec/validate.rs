use crate::error::GraphError;
use crate::exec::meta::MetaResolver;
use crate::store::Store;
use crate::types::NodeType;
use crate::workspace::{Node, SocketValues, all_present};

/// Structural ("meta") validity: every declared input socket resolves to a
/// present meta and the form parses. Usable before any data exists, e.g. for
/// editor feedback. Boundary nodes are meta-valid by definition.
pub async fn is_meta_valid(resolver: &MetaResolver<'_>, node: &Node) -> Result<bool, GraphError> {
    if node.is_boundary() {
        return Ok(true);
    }
    let node_type = resolver.lookup_type(node)?;
    if !node_type.is_form_valid(&node.form) {
        return Ok(false);
    }
    let metas = resolver.meta_inputs(node).await?;
    Ok(all_present(&node_type.inputs(), &metas))
}

/// The gate run before `on_execute` of a non-boundary node: meta validity
/// first (structural), then value-level input validity against the resolved
/// actual values. The two passes stay distinct so structural validation never
/// forces value resolution.
pub async fn validate_execution(
    resolver: &MetaResolver<'_>,
    node: &Node,
    node_type: &dyn NodeType,
    values: &SocketValues,
    store: &dyn Store,
) -> Result<(), GraphError> {
    if !node_type.is_form_valid(&node.form) {
        return Err(GraphError::FormInvalid {
            node_id: node.id.clone(),
        });
    }
    let metas = resolver.meta_inputs(node).await?;
    if !all_present(&node_type.inputs(), &metas) {
        return Err(GraphError::InputInvalid {
            node_id: node.id.clone(),
        });
    }
    if !node_type.is_input_valid(values, store).await? {
        return Err(GraphError::InputInvalid {
            node_id: node.id.clone(),
        });
    }
    Ok(())
}
