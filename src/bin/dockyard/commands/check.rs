//! `dockyard check` command

use anyhow::Result;

use crate::cli::CheckArgs;
use dockyard::util::diagnostic::{self, Diagnostic};

pub fn execute(args: CheckArgs, no_color: bool) -> Result<()> {
    let evaluated = super::evaluate(&args.manifest, no_color)?;
    let eval = &evaluated.evaluation;

    let unregistered: Vec<_> = eval.unregistered().collect();
    for name in &unregistered {
        let diag = Diagnostic::warning(format!("project `{}` is never registered as a crate", name))
            .with_suggestion(format!("Add `[[crate]]` with `name = \"{}\"`", name));
        diagnostic::emit(&diag, evaluated.ctx.color());
    }

    println!(
        "Checked {} project(s), registered {} crate(s)",
        eval.projects().count(),
        evaluated.orchestrator.crates().len()
    );

    if args.deny_unregistered && !unregistered.is_empty() {
        anyhow::bail!("{} project(s) declared but not registered", unregistered.len());
    }

    Ok(())
}
