//! intake: validate and ingest files from the command line.

use anyhow::Context;
use clap::Parser;
use intake_cli::{
    build_ingestor, build_validator, category_row, init_tracing, Cli, Commands, IngestArgs,
};
use intake_core::{ErrorMetadata, IngestError, UploadSource, UploaderConfig};
use serde::Serialize;

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Surface the machine-readable code alongside the message.
fn rejected(err: IngestError) -> anyhow::Error {
    anyhow::anyhow!("{}: {}", err.error_code(), err)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = UploaderConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Upload(args) => upload(config, args).await?,
        Commands::Validate(args) => validate(config, args).await?,
        Commands::Category { name } => match name {
            Some(name) => {
                let category = config
                    .category(&name)
                    .ok_or_else(|| rejected(IngestError::UnknownCategory(name.clone())))?;
                print_json(category)?;
            }
            None => {
                println!("{:<12} {:>12}  {}", "Category", "Max size", "Extensions");
                println!("{}", "-".repeat(80));
                for category in config.categories() {
                    println!("{}", category_row(category));
                }
            }
        },
        Commands::Delete { id } => {
            if config.database.url.is_none() {
                anyhow::bail!("delete needs a database; set DATABASE_URL or database.url");
            }
            let ingestor = build_ingestor(config).await?;
            let record = ingestor
                .find(id)
                .await
                .map_err(rejected)?
                .with_context(|| format!("File {} not found", id))?;
            let outcome = ingestor.delete(&record).await.map_err(rejected)?;
            print_json(&serde_json::json!({
                "id": id,
                "artifact_removed": outcome.artifact_removed,
                "record_removed": outcome.record_removed,
            }))?;
        }
    }

    Ok(())
}

async fn upload(config: UploaderConfig, args: IngestArgs) -> anyhow::Result<()> {
    let ingestor = build_ingestor(config).await?;
    let record = ingestor
        .handle_str(&args.source, &args.options())
        .await
        .map_err(rejected)?;
    let url = ingestor.url(&record);
    print_json(&serde_json::json!({ "file": record, "url": url }))
}

async fn validate(config: UploaderConfig, args: IngestArgs) -> anyhow::Result<()> {
    let category = args.category(&config).to_string();
    let validator = build_validator(config).map_err(rejected)?;

    match UploadSource::classify(&args.source).map_err(rejected)? {
        UploadSource::LocalFile(local) => {
            let validated = validator
                .validate_local(&local, &category, args.max_size)
                .await
                .map_err(rejected)?;
            print_json(&serde_json::json!({
                "valid": true,
                "source": local.path,
                "mime_type": validated.mime_type,
                "extension": validated.extension,
                "category": validated.category.name,
                "size_bytes": validated.bytes.len(),
            }))
        }
        UploadSource::RemoteUrl { url } => {
            validator
                .validate_url(&url, &category, args.max_size)
                .await
                .map_err(rejected)?;
            print_json(&serde_json::json!({ "valid": true, "source": url, "category": category }))
        }
    }
}
