use anyhow::{Context as _, Result};
use clap::Args;
use pulse_core::{config, db};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force re-initialization even if `.pulse/` already exists.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "\
# pulse project configuration.\n\
#\n\
# The cadence table maps each stage window to the form kinds it expects.\n\
# Every window falls back to the shipped default when left out, so only\n\
# the overridden windows need to appear here.\n\
#\n\
# [cadence]\n\
# morning = [\"sleep\", \"sleepiness\", \"visual-fatigue\"]\n\
# midday = [\"sleepiness\", \"visual-fatigue\"]\n\
# afternoon = [\"sleepiness\", \"visual-fatigue\"]\n\
# end-of-shift = [\"sleepiness\", \"visual-fatigue\"]\n\
# night = [\"sleepiness\", \"visual-fatigue\", \"workload\"]\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    project_dir: String,
    ledger: String,
    config: String,
    reinitialized: bool,
}

/// Execute `pulse init`. Creates the project skeleton:
///
/// ```text
/// .pulse/
///   pulse.db       (submission ledger, schema migrated to latest)
///   config.toml    (commented cadence table template)
/// ```
///
/// # Errors
///
/// Returns an error if `.pulse/` already exists and `--force` is not set,
/// or if the ledger cannot be created.
pub fn run_init(args: &InitArgs, output: OutputMode, quiet: bool, project_root: &Path) -> Result<()> {
    let pulse_dir = config::project_dir(project_root);
    let reinitialized = pulse_dir.exists();

    if reinitialized && !args.force {
        anyhow::bail!(".pulse/ already exists. Use `pulse init --force` to reinitialize.");
    }

    // Opening the ledger creates the directory and applies migrations.
    let ledger_path = config::ledger_path(project_root);
    let conn = db::open_ledger(&ledger_path)
        .with_context(|| format!("Failed to create ledger: {}", ledger_path.display()))?;
    drop(conn);

    let config_path = config::config_path(project_root);
    if !config_path.exists() || args.force {
        std::fs::write(&config_path, CONFIG_TOML)
            .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
    }

    let payload = InitOutput {
        project_dir: pulse_dir.display().to_string(),
        ledger: ledger_path.display().to_string(),
        config: config_path.display().to_string(),
        reinitialized,
    };

    render(output, &payload, |out, w| {
        writeln!(w, "✓ Initialized .pulse/ submission ledger.")?;
        writeln!(w)?;
        writeln!(w, "  Ledger: {}", out.ledger)?;
        writeln!(w, "  Config: {}", out.config)?;
        if !quiet {
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  Register a worker:")?;
            writeln!(w, "    pulse worker add ACME/0042 --name \"Lin Wei\"")?;
            writeln!(w)?;
            writeln!(w, "  File a first form:")?;
            writeln!(
                w,
                "    pulse submit --worker ACME/0042 --form sleepiness --data '{{\"score\": 3}}'"
            )?;
        }
        Ok(())
    })
}
