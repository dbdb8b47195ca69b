//! `dockyard targets` command

use anyhow::Result;

use crate::cli::TargetsArgs;
use dockyard::core::EvalError;
use dockyard::ops::format_targets;
use dockyard::Orchestrator;

pub fn execute(args: TargetsArgs, no_color: bool) -> Result<()> {
    let evaluated = super::evaluate(&args.manifest, no_color)?;
    let eval = &evaluated.evaluation;

    let project = eval.project(&args.project).ok_or_else(|| EvalError::UnknownProject {
        project: args.project.clone(),
        declared: eval.projects().map(|d| d.name().to_string()).collect(),
    });
    let project = super::or_exit(project, &evaluated.ctx);

    let targets = if args.declared {
        project.targets().clone()
    } else {
        project.effective_targets(&evaluated.orchestrator.host())
    };

    if targets.is_empty() {
        println!("# `{}` declares no targets", project.name());
    } else {
        print!("{}", format_targets(&targets));
    }

    Ok(())
}
