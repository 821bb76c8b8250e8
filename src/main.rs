//! Polyglot - a multilingual static site builder.

mod build;
mod cli;
mod compiler;
mod config;
mod data;
mod init;
mod logger;
mod serve;
mod utils;
mod watch;

use anyhow::{Result, bail};
use build::{build_site, format_size};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use init::new_site;
use serve::serve_site;
use std::path::Path;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static SiteConfig = Box::leak(Box::new(load_config(cli)?));

    match &cli.command {
        Commands::Init { description, .. } => new_site(config, description.as_deref()),
        Commands::Build { .. } => build_all(config),
        Commands::Serve { .. } => {
            build_all(config)?;
            serve_site(config)
        }
    }
}

/// Load and validate configuration from CLI arguments.
///
/// `init` starts from defaults and only needs the target config path; every
/// other command needs an existing, valid config file.
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    if cli.is_init() {
        let mut config = SiteConfig::default();
        config.update_with_cli(cli);
        config.config_path = config.get_root().join(&cli.config);
        return Ok(config);
    }

    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);
    if !config_path.exists() {
        bail!("Config file `{}` not found.", config_path.display());
    }

    let mut config = SiteConfig::load(&config_path).map_err(|err| {
        log!(err.policy().log_module(); "cannot load {}", config_path.display());
        err
    })?;
    config.update_with_cli(cli);
    Ok(config)
}

/// Build the site; fail the process when any page failed to render.
fn build_all(config: &SiteConfig) -> Result<()> {
    let report = build_site(config)?;
    log!(
        "size";
        "{:>10}  {:>10} gzip  total ({} files, {})",
        format_size(report.total_bytes),
        format_size(report.total_gzip_bytes),
        report.files.len(),
        report.state
    );

    let failed = report.generated.pages.failed;
    if failed > 0 {
        bail!("{failed} pages failed to render");
    }
    Ok(())
}
