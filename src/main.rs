use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use tube2mp3::status::{self, ConsoleStatus};
use tube2mp3::{utils, App, BatchReport, Cli, Commands, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).await?;
    if let Some(dir) = cli.output_dir.clone() {
        config.output_dir = Some(dir);
    }

    match cli.command {
        Commands::Single { url } => {
            let (app, console) = prepare_app(&config, cli.verbose, cli.quiet).await?;

            tracing::info!("Starting single download: {}", url);
            let report = app.download_single(&url).await;

            console.finish();
            print_summary(&app, &report);
        }
        Commands::Batch { file } => {
            let (app, console) = prepare_app(&config, cli.verbose, cli.quiet).await?;

            tracing::info!("Loading links from: {}", file.display());
            let report = app.load_links_and_download(&file).await?;

            console.finish();
            print_summary(&app, &report);
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!(
                    "Configuration file: {}",
                    Config::config_path(cli.config.as_deref())?.display()
                );
                println!("Edit it to change the output directory, delays or tool paths.");
            }
        }
    }

    Ok(())
}

/// Create the output directory, start logging into it and build the app
async fn prepare_app(
    config: &Config,
    verbose: bool,
    quiet: bool,
) -> Result<(App, Arc<ConsoleStatus>)> {
    let output_dir = config.output_dir()?;
    fs_err::create_dir_all(&output_dir).context("Failed to create output directory")?;

    // Errors also go to 0logs.log in the output directory
    status::init_logging(&output_dir, verbose)?;

    // Check for required external dependencies (non-fatal)
    let missing_deps = utils::check_dependencies(&config.tools).await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    let console = Arc::new(ConsoleStatus::new(!quiet));
    let app = App::from_config(config, output_dir, console.clone(), !quiet)?;

    Ok((app, console))
}

fn print_summary(app: &App, report: &BatchReport) {
    if report.processed() > 0 {
        println!(
            "Converted {} of {} into {}",
            report.completed.len(),
            report.processed(),
            app.output_dir().display()
        );
    }
}
