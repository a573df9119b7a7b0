use clap::{Parser, Subcommand};

use client::{ClientError, DataManager, DEFAULT_API_URL};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Backend base URL
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether every file of a dataset is downloaded
    Status { dataset: String },

    /// Download a dataset's files
    Download { dataset: String },

    /// Fetch boundaries for a level, optionally scoped to a parent code
    Boundaries { level: u8, parent: Option<String> },

    /// Delete all downloaded files
    Clear,
}

async fn run(args: Args) -> Result<(), ClientError> {
    let mut manager = DataManager::new(args.api_url);

    match args.command {
        Command::Status { dataset } => {
            let downloaded = manager.dataset_status(&dataset).await?;
            println!(
                "{dataset}: {}",
                if downloaded { "all files present" } else { "files missing" }
            );
        }
        Command::Download { dataset } => {
            let response = manager.download_dataset(&dataset).await?;
            println!("{}", response.message);
            for result in response.results {
                match result.error {
                    Some(error) => println!("  {}: {} ({error})", result.filename, result.status),
                    None => println!("  {}: {}", result.filename, result.status),
                }
            }
        }
        Command::Boundaries { level, parent } => {
            let data = manager.get_boundaries(level, parent.as_deref()).await?;
            let count = data["features"].as_array().map_or(0, Vec::len);
            let status = manager.cache_status();

            println!("Level {level} features: {count}");
            if let Some(version) = status.server_version {
                println!("Server version: {version}");
            }
        }
        Command::Clear => {
            let response = manager.clear_files().await?;
            println!("{}", response.message);
            for result in response.results {
                println!("  {}: deleted={}", result.filename, result.deleted);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
