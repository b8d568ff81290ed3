//! toolforge CLI
//!
//! Generates a Galaxy tool wrapper for a script or executable, runs it for
//! sample outputs, packages it, and optionally publishes it.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod args;
mod output;

use args::{Cli, Commands, GenerateArgs};
use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use secrecy::SecretString;
use std::path::Path;
use toolforge_core::{CoreError, RunContext};
use toolforge_publish::{Installer, ToolShedClient};
use toolforge_runtime::{GenerationMode, RunReport, ToolEngine};
use toolforge_storage::shed::owner_from_email;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Generate(args) => generate(&args),
        Commands::Inspect { descriptor, json } => inspect(&descriptor, json),
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let default = if verbose > 0 { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn generate(args: &GenerateArgs) -> Result<()> {
    let request = args.request()?;
    let ctx = args.context()?;
    let engine = ToolEngine::new(args.engine_config());

    let spinner = output::spinner(format!("building {}", ctx.tool_name));
    let result = engine.run(&ctx, &request);
    spinner.finish_and_clear();
    let report = result.wrap_err_with(|| format!("generating {} failed", ctx.tool_name))?;
    output::summary(&report);

    if args.mode == GenerationMode::Publish {
        if report.succeeded() {
            publish(args, &ctx, &report)?;
        } else {
            tracing::warn!("not publishing a tool that failed execution or validation");
        }
    }

    let code = report.exit_code_for_caller();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn publish(args: &GenerateArgs, ctx: &RunContext, report: &RunReport) -> Result<()> {
    let archive = report
        .archive
        .clone()
        .ok_or_else(|| eyre!("run produced no archive to publish"))?;
    let key = args
        .toolshed_api_key
        .clone()
        .ok_or_else(|| eyre!("--toolshed-api-key or TOOLSHED_API_KEY is required to publish"))?;
    let owner = owner_from_email(&args.user_email);

    let shed = ToolShedClient::new(&args.toolshed_url, SecretString::from(key))
        .map_err(CoreError::from)?;
    let outcome = shed
        .publish(&ctx.tool_name, &owner, &args.tool_desc, &archive)
        .map_err(|e| {
            tracing::error!(error = %e, "publish failed; local package kept");
            CoreError::from(e)
        })?;
    println!(
        "  published to {} (repository {}{})",
        args.toolshed_url,
        outcome.repository_id,
        if outcome.created { ", new" } else { "" }
    );

    if args.install {
        let key = args
            .galaxy_api_key
            .clone()
            .ok_or_else(|| eyre!("--galaxy-api-key or GALAXY_API_KEY is required to install"))?;
        Installer::new(&args.galaxy_url, SecretString::from(key), &args.toolshed_url)
            .install(&ctx.tool_name, &owner, &ctx.runner_log())
            .map_err(CoreError::from)?;
        println!("  installed into {}", args.galaxy_url);
    }
    Ok(())
}

fn inspect(descriptor: &Path, json: bool) -> Result<()> {
    let xml = std::fs::read_to_string(descriptor)
        .wrap_err_with(|| format!("cannot read {}", descriptor.display()))?;
    let io = toolforge_plan::declared_io(&xml).map_err(CoreError::from)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&io)?);
    } else {
        output::declared(&io);
    }
    Ok(())
}
