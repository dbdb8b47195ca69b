//! Command implementations

pub mod check;
pub mod completions;
pub mod show;
pub mod targets;

use anyhow::Result;

use crate::cli::ManifestArgs;
use dockyard::core::{EvalError, Manifest, RecordingOrchestrator};
use dockyard::util::config::{global_config_path, load_config, project_config_path};
use dockyard::util::diagnostic;
use dockyard::{Evaluation, GlobalContext, Orchestrator};

/// A completed evaluation and what the orchestrator received.
pub struct Evaluated {
    pub ctx: GlobalContext,
    pub evaluation: Evaluation,
    pub orchestrator: RecordingOrchestrator,
}

/// Locate, load and evaluate the manifest.
///
/// Evaluation errors are printed as diagnostics and end the process.
pub fn evaluate(args: &ManifestArgs, no_color: bool) -> Result<Evaluated> {
    let mut ctx = GlobalContext::new()?;
    if no_color {
        ctx.disable_color();
    }

    let manifest_path = match &args.manifest {
        Some(path) => path.clone(),
        None => or_exit(ctx.find_manifest(), &ctx),
    };
    let manifest = or_exit(Manifest::load(&manifest_path), &ctx);

    // Settings next to the manifest win over those next to the cwd.
    if manifest.manifest_dir != ctx.cwd() {
        let config = load_config(
            global_config_path().as_deref(),
            &project_config_path(&manifest.manifest_dir),
        );
        ctx = ctx.with_config(config);
        if no_color {
            ctx.disable_color();
        }
    }

    let mut orchestrator = ctx.orchestrator()?;
    tracing::debug!(
        "evaluating {} for host {}",
        manifest_path.display(),
        orchestrator.host()
    );
    let evaluation = or_exit(manifest.evaluate(&mut orchestrator), &ctx);

    Ok(Evaluated {
        ctx,
        evaluation,
        orchestrator,
    })
}

/// Unwrap an evaluation result, reporting the error and exiting on failure.
pub fn or_exit<T>(result: Result<T, EvalError>, ctx: &GlobalContext) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            diagnostic::emit(&err.to_diagnostic(), ctx.color());
            std::process::exit(1);
        }
    }
}
