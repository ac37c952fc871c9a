//! # setupgen — device configuration generator
//!
//! Terminal tool that turns a `setup_config.yaml` catalog into an
//! ESPHome-style firmware configuration whose MQTT birth message announces
//! the device to the bridge over the discovery topic.

mod catalog;
mod menu;
mod render;

use std::path::PathBuf;

use anyhow::Context;
use argh::FromArgs;

use crate::catalog::Catalog;
use crate::menu::Outcome;

/// Generate a device configuration from a setup catalog.
#[derive(FromArgs)]
struct Arguments {
    /// the setup catalog to load.
    #[argh(option, default = "PathBuf::from(\"setup_config.yaml\")")]
    config: PathBuf,

    /// where to write the generated configuration (defaults to
    /// `<device-name>.yaml`).
    #[argh(option)]
    output: Option<PathBuf>,

    /// comma-separated item numbers to enable, replacing the catalog's
    /// defaults (e.g. `--select 1,3`).
    #[argh(option)]
    select: Option<String>,

    /// skip the interactive menu and generate immediately.
    #[argh(switch)]
    non_interactive: bool,
}

fn main() -> anyhow::Result<()> {
    let arguments: Arguments = argh::from_env();
    let mut catalog = Catalog::load(&arguments.config)?;

    if let Some(select) = &arguments.select {
        let selections = catalog::parse_selection(select)?;
        for invalid in catalog.apply_selection(&selections) {
            eprintln!("Invalid selection: {invalid}");
        }
    }

    if !arguments.non_interactive {
        let stdin = std::io::stdin();
        let outcome = menu::run(&mut catalog, stdin.lock(), std::io::stdout())?;
        if outcome == Outcome::Quit {
            return Ok(());
        }
    }

    let rendered = render::render(&catalog)?;
    let output = arguments
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.yaml", catalog.device_info.name)));
    std::fs::write(&output, rendered)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Configuration saved to {}", output.display());

    Ok(())
}
