mod cli;
mod output;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use switchyard_core::config::{load_dotenv, Config};
use switchyard_core::{ExecutionContext, Source};
use switchyard_loader::{java_loader, LoaderRegistry, UriResolver};

use crate::cli::CliArgs;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    let mut config = match args.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    config.routes.extend(args.routes);
    config.classpath.extend(args.classpath);
    if let Some(path) = args.properties {
        config.properties_file = Some(path);
    }
    config.log_summary();

    if config.routes.is_empty() {
        bail!("no route sources given: pass --route or set SWITCHYARD_ROUTES");
    }

    let properties = config.load_properties().with_context(|| {
        format!(
            "failed to load properties from {}",
            config
                .properties_file
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        )
    })?;
    let context = Arc::new(ExecutionContext::with_properties(
        config.context_name.clone(),
        properties,
    ));

    let sources = config
        .routes
        .iter()
        .map(|uri| Source::from_uri(uri).with_context(|| format!("invalid route source '{}'", uri)))
        .collect::<Result<Vec<_>>>()?;

    let resolver = UriResolver::with_classpath(config.classpath.clone());
    let mut registry = LoaderRegistry::new();
    registry
        .register(Arc::new(java_loader(resolver)))
        .context("failed to register java loader")?;

    let report = registry.load_all(&context, &sources);
    info!(
        loaded = report.loaded().count(),
        failed = report.failed().count(),
        rest_configurations = context.rest_configuration_count(),
        "load finished"
    );

    if args.json {
        let value = output::json_report(&context, &report);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        output::print_report(&context, &report, &sources);
    }

    let failed = report.failed().count();
    if failed > 0 {
        bail!("{} of {} route sources failed to load", failed, sources.len());
    }
    Ok(())
}
