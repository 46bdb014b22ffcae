use std::fs;
use std::process;
use std::time::Instant;

use ahash::AHashMap;
use clap::Parser;
use kairo::prelude::*;
use serde::Deserialize;

// --- JSON Deserialization Structs (Input Format Specific) ---
// These structs match the workspace export format and are only used here for
// conversion into kairo's model.

#[derive(Deserialize)]
struct RawWorkspace {
    name: String,
    nodes: Vec<RawNode>,
    connections: Vec<RawConnection>,
    #[serde(default)]
    datasets: Vec<RawDataset>,
}

#[derive(Deserialize)]
struct RawNode {
    id: String,
    #[serde(alias = "type")]
    node_type: String,
    #[serde(default, alias = "scopePath")]
    scope_path: Vec<String>,
    #[serde(default)]
    position: (f64, f64),
    #[serde(default)]
    form: AHashMap<String, String>,
}

#[derive(Deserialize)]
struct RawConnection {
    #[serde(alias = "fromNode")]
    from_node: String,
    #[serde(alias = "fromSocket")]
    from_socket: String,
    #[serde(alias = "toNode")]
    to_node: String,
    #[serde(alias = "toSocket")]
    to_socket: String,
}

#[derive(Deserialize)]
struct RawDataset {
    id: String,
    name: String,
    schema: Vec<RawField>,
    #[serde(default)]
    entries: Vec<AHashMap<String, serde_json::Value>>,
}

#[derive(Deserialize)]
struct RawField {
    name: String,
    #[serde(default, alias = "dataType")]
    data_type: Option<String>,
}

/// A dataflow workspace execution engine CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the workspace export JSON file
    workspace_path: String,

    /// Print the meta resolution of every node instead of executing
    #[arg(short, long)]
    meta_only: bool,
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn parse_data_type(raw: Option<&str>) -> DataType {
    match raw {
        Some("string") => DataType::String,
        Some("number") => DataType::Number,
        Some("boolean") => DataType::Boolean,
        Some("dataset") => DataType::Dataset,
        Some("entry") => DataType::Entry,
        _ => DataType::Any,
    }
}

/// Replays the raw export into the store through the manager so every
/// connection passes the integrity checks.
async fn load_workspace(
    raw: RawWorkspace,
    store: &MemoryStore,
    registry: &NodeTypeRegistry,
) -> Result<String> {
    let workspace = Workspace {
        id: uuid::Uuid::new_v4().to_string(),
        name: raw.name,
    };
    store.save_workspace(workspace.clone()).await?;

    // Dataset ids in node forms reference the raw export's ids, so remap them.
    let mut dataset_ids: AHashMap<String, String> = AHashMap::new();
    for raw_dataset in raw.datasets {
        let schema = raw_dataset
            .schema
            .into_iter()
            .map(|f| ValueSchema::new(f.name, parse_data_type(f.data_type.as_deref())))
            .collect();
        let dataset = store.create_dataset(&raw_dataset.name, schema).await?;
        for values in raw_dataset.entries {
            store.create_entry(&dataset.id, values).await?;
        }
        dataset_ids.insert(raw_dataset.id, dataset.id);
    }

    let manager = WorkspaceManager::new(store, registry);
    let mut node_ids: AHashMap<String, String> = AHashMap::new();
    for raw_node in &raw.nodes {
        let scope_path: ScopePath = raw_node
            .scope_path
            .iter()
            .map(|id| node_ids.get(id).cloned().unwrap_or_else(|| id.clone()))
            .collect();

        // Boundary nodes are created automatically alongside their scope
        // owner; map the export's ids onto the generated pair instead.
        if raw_node.node_type == SCOPE_INPUT_TYPE || raw_node.node_type == SCOPE_OUTPUT_TYPE {
            let boundary = store
                .nodes_in_scope(&workspace.id, &scope_path)
                .await?
                .into_iter()
                .find(|n| n.node_type == raw_node.node_type)
                .unwrap_or_else(|| {
                    exit_with_error(&format!(
                        "Boundary node '{}' has no scope owner in the export",
                        raw_node.id
                    ))
                });
            node_ids.insert(raw_node.id.clone(), boundary.id.clone());
            continue;
        }

        let node = manager
            .create_node(&workspace.id, &raw_node.node_type, scope_path, raw_node.position)
            .await?;
        node_ids.insert(raw_node.id.clone(), node.id.clone());

        let mut stored = store
            .get_node(&node.id)
            .await?
            .unwrap_or_else(|| exit_with_error("node vanished right after creation"));
        for (key, value) in &raw_node.form {
            let value = dataset_ids.get(value).unwrap_or(value);
            stored.form.insert(key.clone(), value.clone());
        }
        store.save_node(stored).await?;
    }

    for raw_connection in raw.connections {
        let resolve = |id: &str| {
            node_ids
                .get(id)
                .cloned()
                .unwrap_or_else(|| exit_with_error(&format!("Unknown node id '{}'", id)))
        };
        manager
            .create_connection(
                SocketRef::new(resolve(&raw_connection.from_node), raw_connection.from_socket),
                SocketRef::new(resolve(&raw_connection.to_node), raw_connection.to_socket),
            )
            .await?;
    }

    Ok(workspace.id)
}

async fn print_metas(
    workspace_id: &str,
    store: &MemoryStore,
    registry: &NodeTypeRegistry,
) -> Result<()> {
    let resolver = MetaResolver::new(store, registry);
    let nodes = store.nodes_in_scope(workspace_id, &ScopePath::new()).await?;
    for node in nodes {
        let metas = resolver.meta_of(&node).await?;
        let valid = is_meta_valid(&resolver, &node).await?;
        println!(
            "{} ({}) meta-valid={} outputs={}",
            node.id,
            node.node_type,
            valid,
            serde_json::to_string(&metas)?
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let cli = Cli::parse();

    let raw_json = fs::read_to_string(&cli.workspace_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read workspace file '{}': {}",
            &cli.workspace_path, e
        ))
    });
    let raw: RawWorkspace = serde_json::from_str(&raw_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse workspace JSON: {}", e)));

    let store = MemoryStore::new();
    let registry = NodeTypeRegistry::with_defaults();

    let load_start = Instant::now();
    let workspace_id = load_workspace(raw, &store, &registry).await?;
    println!("Workspace loaded in {:?}", load_start.elapsed());

    if cli.meta_only {
        return print_metas(&workspace_id, &store, &registry).await;
    }

    println!("\nStarting calculation...");
    let run_start = Instant::now();
    let tracker = CalculationTracker::new(&store, &registry);
    let process = tracker.start(&workspace_id).await?;
    println!(
        "Calculation finished in {:?}: {:?} ({}/{} outputs)",
        run_start.elapsed(),
        process.state,
        process.processed_outputs,
        process.total_outputs
    );

    let nodes = store.nodes_in_scope(&workspace_id, &ScopePath::new()).await?;
    for node in nodes {
        if let Some(result) = store.get_result(&node.id).await? {
            println!("{} ({}): {}", node.id, node.node_type, result);
        }
    }
    Ok(())
}
