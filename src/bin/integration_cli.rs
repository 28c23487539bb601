use clap::{Parser, Subcommand};
use integration_mapper::config::load_engine_config;
use integration_mapper::integration::{IntegrationRequest, IntegrationService};
use integration_mapper::mapping::{extract, group};
use integration_mapper::schema::{load_project_from_file, prepare_schema, InMemorySchemaStore};
use integration_mapper::store::{InMemoryRecordStore, LogErrorSink};
use log::{info, LevelFilter};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every occurrence of a property in a payload
    Extract {
        /// Path to the payload JSON file
        #[arg(required = true)]
        payload: PathBuf,
        /// Property name to search for
        #[arg(long, short, required = true)]
        property: String,
    },
    /// Print the grouped buckets a project produces for a payload
    Group {
        /// Path to the project definition JSON file
        #[arg(long, short, required = true)]
        project: PathBuf,
        /// Path to the payload JSON file
        #[arg(required = true)]
        payload: PathBuf,
    },
    /// Map a payload against an in-memory store and print the response
    Run {
        /// Path to the project definition JSON file
        #[arg(long, short, required = true)]
        project: PathBuf,
        /// Path to the payload JSON file
        #[arg(required = true)]
        payload: PathBuf,
        /// Store fixture JSON file with pre-existing records
        #[arg(long, short)]
        fixture: Option<PathBuf>,
        /// Engine configuration file
        #[arg(long, short)]
        config: Option<String>,
        /// External document number reported with errors
        #[arg(long)]
        document_id: Option<String>,
        /// Print the submitted records after the response
        #[arg(long)]
        dump: bool,
    },
}

fn read_payload(path: &PathBuf) -> Result<Value, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn handle_extract(payload: PathBuf, property: String) -> Result<(), Box<dyn std::error::Error>> {
    let payload = read_payload(&payload)?;
    let occurrences = extract(&payload, &property);
    info!("Found {} occurrences of '{}'", occurrences.len(), property);
    println!("{}", serde_json::to_string_pretty(&occurrences)?);
    Ok(())
}

fn handle_group(project: PathBuf, payload: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let definition = load_project_from_file(&project)?;
    let fields = prepare_schema(definition.fields)?;
    let payload = read_payload(&payload)?;
    let buckets = group(&fields, &payload);
    info!("Grouped payload into {} buckets", buckets.len());
    println!("{}", serde_json::to_string_pretty(&buckets)?);
    Ok(())
}

fn handle_run(
    project: PathBuf,
    payload: PathBuf,
    fixture: Option<PathBuf>,
    config: Option<String>,
    document_id: Option<String>,
    dump: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let definition = load_project_from_file(&project)?;
    let project_id = definition.project.id.clone();
    let mut schemas = InMemorySchemaStore::new();
    schemas.insert(definition);

    let mut records = match fixture {
        Some(path) => InMemoryRecordStore::from_fixture_file(path)?,
        None => InMemoryRecordStore::new(),
    };

    let config = load_engine_config(config.as_deref())?;
    config.validate()?;

    let mut request = IntegrationRequest::new(read_payload(&payload)?).for_project(&project_id);
    request.document_id = document_id;

    let sink = LogErrorSink;
    let response = {
        let mut service = IntegrationService::new(&schemas, &mut records, &sink, config);
        service.post(&request)
    };
    println!("{}", serde_json::to_string_pretty(&response)?);

    if dump {
        for id in records.submitted() {
            if let Some(record) = records.record(id) {
                println!("{}: {}", id, serde_json::to_string_pretty(record)?);
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // RUST_LOG, when set, overrides the flag
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Extract { payload, property } => handle_extract(payload, property)?,
        Commands::Group { project, payload } => handle_group(project, payload)?,
        Commands::Run {
            project,
            payload,
            fixture,
            config,
            document_id,
            dump,
        } => handle_run(project, payload, fixture, config, document_id, dump)?,
    }

    Ok(())
}
