//! `dockyard completions` command

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::{Cli, CompletionsArgs};

pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let mut script = Vec::new();
    generate(args.shell, &mut cmd, "dockyard", &mut script);

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(&path, &script)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("wrote {} completions to {}", args.shell, path.display());
        }
        None => io::stdout().write_all(&script)?,
    }

    Ok(())
}
