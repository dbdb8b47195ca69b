//! `dockyard show` command

use anyhow::{Context, Result};

use crate::cli::ShowArgs;
use dockyard::core::{EvalError, ProjectDescriptor};
use dockyard::ops::format_descriptor;

pub fn execute(args: ShowArgs, no_color: bool) -> Result<()> {
    let evaluated = super::evaluate(&args.manifest, no_color)?;
    let orch = &evaluated.orchestrator;

    let descriptors: Vec<&ProjectDescriptor> = match &args.project {
        Some(name) => {
            let found = orch.project(name).ok_or_else(|| EvalError::UnknownProject {
                project: name.clone(),
                declared: orch.projects().map(|d| d.name().to_string()).collect(),
            });
            vec![super::or_exit(found, &evaluated.ctx)]
        }
        None => orch.projects().collect(),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&descriptors)
            .context("failed to serialize descriptors")?;
        println!("{}", json);
        return Ok(());
    }

    for (i, descriptor) in descriptors.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{}", format_descriptor(descriptor));
    }

    Ok(())
}
