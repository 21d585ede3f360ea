use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;
mod settings;
mod surface;

use cli::Cli;
use cli::commands::Commands;
use settings::Settings;

use surveyr::publisher::snippet::{SnippetAssets, embed_snippets};
use surveyr::publisher::{PublishForm, Publisher};
use surveyr::session::{ClientStore, FileStore, MemoryStore, TENANT_KEY, ensure_tenant, resolve_tenant};
use surveyr::store::{ConfigStore, HttpConfigStore, HttpResponseSink};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("surveyr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("surveyr.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn durable_store(settings: &Settings) -> Result<FileStore> {
    let path = settings.storage.resolve_data_dir().join("client.json");
    FileStore::open(path).context("Failed to open durable client storage")
}

async fn run_application(cli: &Cli, settings: &Settings) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Publish {
            rating_title,
            comment_title,
            placeholder,
            wait_time,
            max_display,
            display_frequency,
        } => {
            let form = PublishForm {
                rating_title: rating_title.clone(),
                comment_title: comment_title.clone(),
                placeholder: placeholder.clone(),
                wait_time: *wait_time,
                max_display: *max_display,
                display_frequency: *display_frequency,
            };
            handle_publish(&form, settings).await
        }
        Commands::Show => handle_show(settings).await,
        Commands::Snippet => handle_snippet(settings),
        Commands::Run => handle_run(settings).await,
        Commands::Reset => handle_reset(settings),
    }
}

async fn handle_publish(form: &PublishForm, settings: &Settings) -> Result<()> {
    let durable = durable_store(settings)?;
    let tenant = ensure_tenant(&durable)?;
    info!("Publishing configuration for tenant: {}", tenant);

    let store = Arc::new(HttpConfigStore::new(settings.service.base_url.as_str())?);
    let publisher = Publisher::new(store);
    let record = publisher.publish(&tenant, form).await?;

    println!(
        "{} wait {}s, up to {} displays, every {}min",
        "Published:".green(),
        record.wait_time,
        record.max_display,
        record.display_frequency
    );
    print_snippets(&tenant, settings);
    Ok(())
}

async fn handle_show(settings: &Settings) -> Result<()> {
    let durable = durable_store(settings)?;
    let Some(tenant) = resolve_tenant(&durable)? else {
        println!(
            "{}",
            "No tenant identifier yet; run `surveyr publish` first.".yellow()
        );
        return Ok(());
    };

    let store = HttpConfigStore::new(settings.service.base_url.as_str())?;
    match store.get(&tenant).await? {
        Some(record) => {
            println!("{} {}", "Tenant:".green(), tenant);
            println!("  rating title:      {}", record.rating_title);
            println!("  comment title:     {}", record.comment_title);
            println!("  placeholder:       {}", record.placeholder);
            println!("  wait time:         {}s", record.wait_time);
            println!("  max display:       {}", record.max_display);
            println!("  display frequency: {}min", record.display_frequency);
        }
        None => {
            println!("{}", "No configuration published for this tenant.".yellow());
        }
    }
    Ok(())
}

fn handle_snippet(settings: &Settings) -> Result<()> {
    let durable = durable_store(settings)?;
    let tenant = ensure_tenant(&durable)?;
    print_snippets(&tenant, settings);
    Ok(())
}

async fn handle_run(settings: &Settings) -> Result<()> {
    let durable = durable_store(settings)?;
    let store = Arc::new(HttpConfigStore::new(settings.service.base_url.as_str())?);
    let sink = Arc::new(HttpResponseSink::new(settings.service.base_url.as_str())?);
    let session = MemoryStore::new();

    match surveyr::scheduler::activate(store, sink, &durable, session).await? {
        Some(handle) => surface::run(handle).await,
        None => {
            println!(
                "{}",
                "No tenant identifier; widget stays dormant. Run `surveyr publish` first."
                    .yellow()
            );
            Ok(())
        }
    }
}

fn handle_reset(settings: &Settings) -> Result<()> {
    let durable = durable_store(settings)?;
    durable.remove(TENANT_KEY)?;
    println!("{}", "Cleared local tenant binding.".green());
    Ok(())
}

fn print_snippets(tenant: &str, settings: &Settings) {
    let assets = SnippetAssets {
        stylesheet_url: settings.assets.stylesheet_url.clone(),
        script_url: settings.assets.script_url.clone(),
    };
    println!("{}", "Embed snippets:".cyan());
    for snippet in embed_snippets(tenant, &assets) {
        println!("  {}", snippet);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load settings
    let settings = Settings::load(cli.config.as_ref()).context("Failed to load settings")?;
    settings.validate()?;

    info!("Starting with settings from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &settings)
        .await
        .context("Application failed")?;

    Ok(())
}
