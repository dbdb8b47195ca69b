//! Human-readable rendering of descriptors.

use std::fmt::Write;

use crate::core::native_deps::{DependencyRole, DependencySet};
use crate::core::target_matrix::TargetMatrix;
use crate::core::project::ProjectDescriptor;

/// Render a registered descriptor.
pub fn format_descriptor(descriptor: &ProjectDescriptor) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", descriptor.name());
    let _ = writeln!(out, "  path: {}", descriptor.path().display());
    write_deps(&mut out, "deps", descriptor.deps_config());
    write_deps(&mut out, "build", descriptor.build_config());
    let _ = writeln!(out, "  targets:");
    out.push_str(&format_targets(descriptor.targets()));
    out
}

/// Render a target matrix, one platform per line.
pub fn format_targets(targets: &TargetMatrix) -> String {
    let mut out = String::new();
    for (platform, selector) in targets.iter() {
        match platform.alias() {
            Some(alias) if alias != platform.triple() => {
                let _ = writeln!(out, "    {} ({}) = {}", platform, alias, selector);
            }
            _ => {
                let _ = writeln!(out, "    {} = {}", platform, selector);
            }
        }
    }
    out
}

fn write_deps(out: &mut String, stage: &str, deps: &DependencySet) {
    if deps.is_empty() {
        let _ = writeln!(out, "  {}: (none)", stage);
        return;
    }
    let _ = writeln!(out, "  {}:", stage);
    for role in [DependencyRole::BuildTimeOnly, DependencyRole::BuildAndLink] {
        let packages = deps.packages(role);
        if !packages.is_empty() {
            let _ = writeln!(out, "    {}: {}", role, packages.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::orchestrator::RecordingOrchestrator;
    use crate::core::platform::PlatformTarget;
    use crate::core::profile::ProfileSelector;
    use crate::core::project::{PackageName, ProjectDeclaration};
    use crate::ops::evaluate::Evaluation;
    use tempfile::TempDir;

    #[test]
    fn test_format_descriptor() {
        let tmp = TempDir::new().unwrap();
        let mut orch = RecordingOrchestrator::new().with_host(PlatformTarget::X86_64LinuxGnu);
        let mut eval = Evaluation::new(tmp.path());
        let deps = DependencySet::declare(DependencyRole::BuildAndLink, ["openssl"]).unwrap();

        eval.declare_project(
            &orch,
            ProjectDeclaration::new(PackageName::new("freenet-core").unwrap(), ".")
                .deps_config(deps)
                .target(PlatformTarget::Wasm32Unknown, ProfileSelector::all()),
        )
        .unwrap();
        eval.register("freenet-core", &mut orch).unwrap();

        let text = format_descriptor(eval.registered("freenet-core").unwrap());
        assert!(text.starts_with("freenet-core\n"));
        assert!(text.contains("  deps:\n    link: openssl\n"));
        assert!(text.contains("  build:\n    link: openssl\n"));
        assert!(text.contains("    wasm32-unknown-unknown (wasm-generic) = [*]\n"));
    }

    #[test]
    fn test_format_empty_deps() {
        let mut out = String::new();
        write_deps(&mut out, "deps", &DependencySet::new());
        assert_eq!(out, "  deps: (none)\n");
    }
}
