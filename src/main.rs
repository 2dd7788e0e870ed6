mod cli;

use gifforge::app::{self, CaptureArgs};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use gf_av::ToolRegistry;
use gf_core::Config;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "gifforge=debug,gf_core=debug,gf_av=debug,gf_pipeline=debug,gf_telemetry=debug"
                .to_string()
        } else {
            "gifforge=info,gf_core=info,gf_av=info,gf_pipeline=info,gf_telemetry=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// The exit status for `err`, taken from the first [`gf_core::Error`] in its chain.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<gf_core::Error>())
        .map(gf_core::Error::exit_code)
        .unwrap_or(1)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert {
            video,
            from,
            length,
            fps,
            scale,
            speed,
            port,
            output,
            dry_run,
        } => {
            let config = Config::load_or_default(cli.config.as_deref());
            let capture = CaptureArgs {
                from,
                length,
                fps,
                scale,
                speed,
                port: port.unwrap_or(config.telemetry.port),
                dry_run,
                verbose: cli.verbose,
            };
            convert(&config, &video, capture, output)
        }
        Commands::Probe { file, json } => {
            let config = Config::load_or_default(cli.config.as_deref());
            probe_file(&config, &file, json)
        }
        Commands::CheckTools => {
            let config = Config::load_or_default(cli.config.as_deref());
            check_tools(&config);
            Ok(())
        }
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("gifforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn convert(
    config: &Config,
    video: &str,
    capture: CaptureArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    let video = app::sanitize_input(video).context("The video file provided is invalid")?;
    let run = capture.into_run_config()?;
    let dry_run = run.dry_run;

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async {
        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted; stopping before the next cancellable stage");
                    cancel.cancel();
                }
            }
        });

        let outcome = app::convert(config, &video, run, output.as_deref(), cancel).await;
        interrupt.abort();
        outcome
    })?;

    if dry_run {
        println!("[DRY RUN] Would run {} commands:", outcome.reports.len());
        for report in &outcome.reports {
            println!("  {}", report.command);
        }
        return Ok(());
    }

    if let Some(progress) = &outcome.progress {
        tracing::debug!(
            updates = progress.updates,
            dropped_frames = progress.dropped_frames,
            "Progress summary"
        );
    }
    if let Some(gif) = &outcome.gif {
        println!("Output: {}", gif.display());
    }

    Ok(())
}

fn probe_file(config: &Config, file: &str, json: bool) -> Result<()> {
    let path = app::sanitize_input(file).context("The video file provided is invalid")?;
    let tools = ToolRegistry::discover(&config.tools);

    let rt = tokio::runtime::Runtime::new()?;
    let video = rt
        .block_on(app::probe_video(&tools, &path))
        .with_context(|| format!("Not a video file: {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&video)?);
        return Ok(());
    }

    println!("File: {}", video.source_path.display());
    println!(
        "Duration: {}",
        gf_core::timecode::format_timecode(video.duration)
    );
    match video.size {
        Some(size) => println!("Size: {}x{}", size.width, size.height),
        None => println!("Size: unknown"),
    }
    match video.frame_rate {
        Some(fps) => println!("Frame rate: {fps:.3} fps"),
        None => println!("Frame rate: unknown"),
    }

    Ok(())
}

fn check_tools(config: &Config) {
    println!("Checking external tools...\n");

    let registry = ToolRegistry::discover(&config.tools);
    let tools = registry.check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to convert videos.");
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = Config::load(p)
                .with_context(|| format!("Failed to load config {}", p.display()))?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!(
        "  Telemetry: {} on {}:{} (agent prefix {:?})",
        if config.telemetry.enabled { "enabled" } else { "disabled" },
        config.telemetry.host,
        config.telemetry.port,
        config.telemetry.agent_prefix
    );
    println!("  Work root: {}", config.work.temp_root().join(&config.work.namespace).display());
    println!("  Keep frames: {}", config.work.keep_frames);

    for warning in config.validate() {
        println!("  warning: {warning}");
    }

    Ok(())
}
