use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vis_core::{CategoryRegistry, CoreResult, TypeRegistry, VisRegistry};
use vis_response::Row;
use vis_saved::{
    JsonFileStore, MemoryStore, PersistenceStore, SavedVis, SavedVisRecord, SavedVisResult,
    VisServices,
};

mod offline;

#[derive(Parser)]
#[command(name = "vis-cli")]
#[command(about = "Saved visualization tool - inspect state, aggregation requests and responses", long_about = None)]
struct Cli {
    /// Category table (YAML or JSON); the built-in table when omitted
    #[arg(long, global = true)]
    categories: Option<PathBuf>,
    /// Visualization type table (YAML or JSON); the built-in table when omitted
    #[arg(long, global = true)]
    types: Option<PathBuf>,
    /// Directory holding saved visualization records
    #[arg(long, global = true, default_value = "visualizations")]
    store: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List config categories in fetch order
    Categories,
    /// List visualization types
    Types,
    /// Print the normalized state of a record file
    State {
        /// Path to the record JSON file
        record: PathBuf,
    },
    /// Print the aggregation request a record file produces
    Dsl {
        /// Path to the record JSON file
        record: PathBuf,
    },
    /// Flatten a recorded query response against a record's aggregations
    Flatten {
        /// Path to the record JSON file
        record: PathBuf,
        /// Path to the response JSON file
        response: PathBuf,
        /// Emit CSV instead of JSON
        #[arg(long)]
        csv: bool,
        /// Output file (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Copy a record file into the store
    Import {
        /// Path to the record JSON file
        record: PathBuf,
        /// Id to store it under; generated when omitted
        #[arg(long)]
        id: Option<String>,
    },
    /// List records in the store
    List,
    /// Show a stored record
    Show {
        /// Record id
        id: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> SavedVisResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let registry = load_registry(cli.categories.as_deref(), cli.types.as_deref())?;

    match cli.command {
        Commands::Categories => cmd_categories(&registry),
        Commands::Types => cmd_types(&registry),
        Commands::State { record } => cmd_state(registry, &record),
        Commands::Dsl { record } => cmd_dsl(registry, &record).await,
        Commands::Flatten {
            record,
            response,
            csv,
            output,
        } => cmd_flatten(registry, &record, &response, csv, output.as_deref()).await,
        Commands::Import { record, id } => cmd_import(registry, &cli.store, &record, id).await,
        Commands::List => cmd_list(&cli.store),
        Commands::Show { id } => cmd_show(registry, &cli.store, &id).await,
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

fn load_registry(categories: Option<&Path>, types: Option<&Path>) -> SavedVisResult<VisRegistry> {
    let categories = match categories {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            parse_table(path, &content, CategoryRegistry::from_json_str, CategoryRegistry::from_yaml_str)?
        }
        None => CategoryRegistry::standard(),
    };
    let types = match types {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            parse_table(path, &content, TypeRegistry::from_json_str, TypeRegistry::from_yaml_str)?
        }
        None => TypeRegistry::standard(),
    };
    Ok(VisRegistry::new(categories, types))
}

fn parse_table<T>(
    path: &Path,
    content: &str,
    from_json: fn(&str) -> CoreResult<T>,
    from_yaml: fn(&str) -> CoreResult<T>,
) -> CoreResult<T> {
    if is_json(path) {
        from_json(content)
    } else {
        from_yaml(content)
    }
}

fn services(
    registry: VisRegistry,
    store: Arc<dyn PersistenceStore>,
    response: Option<Value>,
) -> VisServices {
    VisServices::new(
        registry,
        store,
        Arc::new(offline::NoSavedSearches),
        Arc::new(offline::NamedIndexPatterns),
        Arc::new(offline::RecordedResponse::new(response)),
    )
}

fn read_record(path: &Path) -> SavedVisResult<SavedVisRecord> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn open_record(registry: VisRegistry, path: &Path, response: Option<Value>) -> SavedVisResult<SavedVis> {
    let record = read_record(path)?;
    let services = services(registry, Arc::new(MemoryStore::new()), response);
    SavedVis::from_record(services, None, record)
}

fn cmd_categories(registry: &VisRegistry) -> SavedVisResult<()> {
    println!("Categories in fetch order:");
    for category in registry.categories().fetch_order() {
        let agg = category
            .config_defaults
            .get("agg")
            .and_then(Value::as_str)
            .unwrap_or("-");
        println!(
            "  {} (min {}, order {}, default agg {})",
            category.name, category.min, category.order, agg
        );
    }
    Ok(())
}

fn cmd_types(registry: &VisRegistry) -> SavedVisResult<()> {
    let default_type = registry.types().default_type();
    println!("Visualization types:");
    for def in registry.types().all() {
        let marker = if def.name == default_type { " (default)" } else { "" };
        println!("  {}{}", def.name, marker);
        for (category, overrides) in &def.config {
            if let Some(min) = overrides.min {
                println!("    {} min {}", category, min);
            }
        }
    }
    Ok(())
}

fn cmd_state(registry: VisRegistry, record_path: &Path) -> SavedVisResult<()> {
    let vis = open_record(registry, record_path, None)?;
    let state = vis.state().get_state();
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

async fn cmd_dsl(registry: VisRegistry, record_path: &Path) -> SavedVisResult<()> {
    let mut vis = open_record(registry, record_path, None)?;
    vis.resolve_source().await?;
    let request = vis.search_source()?.to_request();
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

async fn cmd_flatten(
    registry: VisRegistry,
    record_path: &Path,
    response_path: &Path,
    csv: bool,
    output: Option<&Path>,
) -> SavedVisResult<()> {
    let response: Value = serde_json::from_str(&std::fs::read_to_string(response_path)?)?;
    let mut vis = open_record(registry, record_path, Some(response))?;
    let rows = vis.fetch().await?;

    let content = if csv {
        rows_to_csv(&rows)
    } else {
        let mut json = serde_json::to_string_pretty(&rows)?;
        json.push('\n');
        json
    };

    if let Some(path) = output {
        std::fs::write(path, content)?;
        println!("✓ Wrote {} rows to {}", rows.len(), path.display());
    } else {
        print!("{}", content);
    }
    Ok(())
}

async fn cmd_import(
    registry: VisRegistry,
    store_dir: &Path,
    record_path: &Path,
    id: Option<String>,
) -> SavedVisResult<()> {
    let record = read_record(record_path)?;
    let store = Arc::new(JsonFileStore::new(store_dir.to_path_buf())?);
    // Round-trip through the state so the stored stateJSON is normalized.
    let mut vis = SavedVis::from_record(services(registry, store, None), id, record)?;
    let id = vis.save().await?;
    println!("✓ Stored visualization {} in {}", id, store_dir.display());
    Ok(())
}

fn cmd_list(store_dir: &Path) -> SavedVisResult<()> {
    let store = JsonFileStore::new(store_dir.to_path_buf())?;
    let ids = store.list_ids()?;
    if ids.is_empty() {
        println!("No visualizations found in {}", store_dir.display());
    } else {
        println!("Visualizations:");
        for id in ids {
            println!("  {}", id);
        }
    }
    Ok(())
}

async fn cmd_show(registry: VisRegistry, store_dir: &Path, id: &str) -> SavedVisResult<()> {
    let store = Arc::new(JsonFileStore::new(store_dir.to_path_buf())?);
    let vis = SavedVis::load(services(registry, store, None), id).await?;
    let state = vis.state();

    println!("{} ({})", state.title, state.type_name());
    if !state.description.is_empty() {
        println!("  {}", state.description);
    }
    println!("  source: {:?}", state.related_source());
    for category in state.categories() {
        println!("  {} ({} of min {})", category.name(), category.len(), category.min());
        for config in category.configs() {
            println!(
                "    {} {}",
                config.agg,
                Value::Object(config.agg_params.clone())
            );
        }
    }
    Ok(())
}

fn rows_to_csv(rows: &[Row]) -> String {
    let mut csv = String::new();
    let Some(first) = rows.first() else {
        csv.push_str("doc_count\n");
        return csv;
    };

    let mut header: Vec<String> = Vec::new();
    header.extend(first.dimensions.iter().map(|d| format!("{}:{}", d.agg_key, d.agg)));
    header.extend(first.metrics.iter().map(|m| format!("{}:{}", m.agg_key, m.agg)));
    header.push("doc_count".to_string());
    csv.push_str(&header.join(","));
    csv.push('\n');

    for row in rows {
        let mut fields: Vec<String> = Vec::new();
        fields.extend(row.dimensions.iter().map(|d| csv_field(&d.label)));
        fields.extend(row.metrics.iter().map(|m| csv_field(&value_text(&m.value))));
        fields.push(row.doc_count.map(|c| c.to_string()).unwrap_or_default());
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }
    csv
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vis_response::{Dimension, Metric};

    #[test]
    fn csv_quotes_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_rows() {
        let rows = vec![Row {
            dimensions: vec![Dimension {
                agg_key: "_agg_0".into(),
                agg: "terms".into(),
                key: json!("GET"),
                label: "GET".into(),
            }],
            metrics: vec![Metric {
                agg_key: "_agg_1".into(),
                agg: "avg".into(),
                value: json!(1.5),
            }],
            doc_count: Some(4),
        }];
        assert_eq!(
            rows_to_csv(&rows),
            "_agg_0:terms,_agg_1:avg,doc_count\nGET,1.5,4\n"
        );
        assert_eq!(rows_to_csv(&[]), "doc_count\n");
    }
}
