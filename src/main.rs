use clap::Parser;
use color_eyre::eyre::{bail, Result};
use tracing_subscriber::EnvFilter;

use tfinv::cli::Cli;
use tfinv::error::InventoryError;
use tfinv::groups::{aggregate, AggregateOptions};
use tfinv::{input, output, terraform};

fn main() -> Result<()> {
    color_eyre::install()?;

    // Diagnostics go to stderr so stdout stays parseable by Ansible.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if !cli.list && !cli.inventory && cli.host.is_none() {
        bail!("either --list, --inventory or --host must be specified");
    }

    let path = match &cli.path {
        Some(path) => path.clone(),
        None => input::locate_state(),
    };
    let raw = input::read_state(&path)?;

    let config = cli.resolve_config();
    let view = terraform::normalize(&raw, &config)?;

    if let Some(host) = &cli.host {
        match output::render_host(&view, host)? {
            Some(json) => println!("{json}"),
            None => {
                let err = InventoryError::HostNotFound(host.clone());
                tracing::warn!(%err);
                println!("{{}}");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let aggregation = aggregate(
        &view,
        AggregateOptions {
            resolve_tag_aliases: true,
        },
    );
    for collision in &aggregation.collisions {
        tracing::warn!(
            family = %collision.family,
            name = %collision.name,
            "name collision, keeping the later entry"
        );
    }

    if cli.list {
        println!("{}", output::render_list(&aggregation.groups)?);
    } else {
        print!("{}", output::render_inventory(&aggregation.groups)?);
    }

    Ok(())
}
