use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::{DEBUGBAR_PACKAGE, IDE_HELPER_PACKAGE, SELF_PACKAGE, ScaffoldConfig};
use crate::infrastructure::{CommandRunner, ManifestStore, TreeRenamer};
use crate::stubs;

/// Directories never touched by the tree-wide rename
const RENAME_EXCLUDES: &[&str] = &["vendor", ".git"];
/// Manifest namespace that owns the dont-discover list
const EXTRA_NAMESPACE: &str = "laravel";
const POST_UPDATE_HOOK: &str = "post-update-cmd";
const IDE_HELPER_GENERATE: &str = "php artisan ide-helper:generate";
/// Upper bound for any single external command
const COMMAND_TIMEOUT: Duration = Duration::from_secs(3600);

/// Run the scaffold pipeline: an ordered list of steps, some gated on the
/// configuration, executed strictly in sequence. The first failing step
/// aborts the rest.
///
/// There is no rollback: a failure leaves the project in whatever partial
/// state existed at that point. Every step is idempotent, so the expected
/// recovery is to fix the cause and re-run from scratch.
///
/// # Errors
///
/// Returns the first manifest, filesystem or external-command error raised
/// by a step.
pub fn run<M: ManifestStore, R: CommandRunner>(
    root: &Path,
    config: &ScaffoldConfig,
    store: &M,
    runner: &R,
) -> Result<()> {
    type Step<'s> = (&'static str, bool, Box<dyn Fn() -> Result<()> + 's>);

    let steps: Vec<Step<'_>> = vec![
        (
            "structure",
            true,
            Box::new(|| set_up_structure(root, config)),
        ),
        (
            "packages",
            !config.packages.is_empty(),
            Box::new(|| provision_packages(root, config, store, runner)),
        ),
        (
            "ui",
            config.ui_command().is_some(),
            Box::new(|| scaffold_ui(config, runner)),
        ),
        ("cleanup", config.remove_self, Box::new(|| remove_self(store))),
        ("sync", true, Box::new(|| sync_dependencies(config, runner))),
    ];

    for (name, enabled, step) in steps {
        if !enabled {
            debug!("Skipping step: {name}");
            continue;
        }
        step()?;
    }

    Ok(())
}

/// Create the models directory, write the abstract model, relocate and
/// re-namespace `User.php`, and rewrite every `App\User` reference.
fn set_up_structure(root: &Path, config: &ScaffoldConfig) -> Result<()> {
    let models_dir = root.join("app").join(&config.models_dir);
    let replacements = [
        ("{ModelsDirectoryName}", config.models_dir.as_str()),
        ("{AbstractModelName}", config.abstract_model.as_str()),
    ];

    info!("Creating models directory: {}", config.models_dir);
    if !models_dir.exists() {
        fs::create_dir_all(&models_dir)
            .with_context(|| format!("failed to create {}", models_dir.display()))?;
    }

    info!("Creating abstract model: {}", config.abstract_model);
    let abstract_path = models_dir.join(format!("{}.php", config.abstract_model));
    fs::write(
        &abstract_path,
        stubs::render(stubs::ABSTRACT_MODEL, &replacements),
    )
    .with_context(|| format!("failed to write {}", abstract_path.display()))?;

    let legacy_path = root.join("app").join("User.php");
    let user_path = models_dir.join("User.php");
    if legacy_path.is_file() {
        info!("Moving User.php to app/{}/User.php", config.models_dir);
        fs::rename(&legacy_path, &user_path).with_context(|| {
            format!(
                "failed to move {} to {}",
                legacy_path.display(),
                user_path.display()
            )
        })?;
        // A well-formed source file declares its namespace exactly once at
        // the top; the literal replace relies on that and does not guard
        // against `App;` occurring elsewhere in the file.
        let namespaced = format!("App\\{};", config.models_dir);
        TreeRenamer::replace_in_file(&user_path, &[("App;", namespaced.as_str())])?;
    }

    info!(
        "Changing App\\User references to App\\{}\\User",
        config.models_dir
    );
    let renamer = TreeRenamer::new(root, RENAME_EXCLUDES);
    let new_reference = format!("App\\{}\\User", config.models_dir);
    renamer.rename_all("App\\User", "*.php", &[("App\\User", new_reference.as_str())])?;

    info!(
        "Extending User from App\\{}\\{}",
        config.models_dir, config.abstract_model
    );
    fs::write(&user_path, stubs::render(stubs::USER_MODEL, &replacements))
        .with_context(|| format!("failed to write {}", user_path.display()))?;

    Ok(())
}

/// Suppress auto-discovery for the dev packages, require each of them, and
/// register them in the application service provider.
fn provision_packages<M: ManifestStore, R: CommandRunner>(
    root: &Path,
    config: &ScaffoldConfig,
    store: &M,
    runner: &R,
) -> Result<()> {
    info!("Suppressing auto-discovery for dev packages");
    let mut manifest = store.load()?;
    manifest.add_dont_discover(EXTRA_NAMESPACE, &config.packages)?;
    store.save(&manifest)?;

    for package in &config.packages {
        info!("Requiring {package}");
        let args = config.composer_argv(&["require", package, "--dev"]);
        runner.run(&args, COMMAND_TIMEOUT, &mut forward_output)?;
    }

    info!("Registering dev packages in AppServiceProvider");
    let providers_dir = root.join("app").join("Providers");
    fs::create_dir_all(&providers_dir)
        .with_context(|| format!("failed to create {}", providers_dir.display()))?;
    let provider_path = providers_dir.join("AppServiceProvider.php");
    fs::write(&provider_path, provider_stub(&config.packages))
        .with_context(|| format!("failed to write {}", provider_path.display()))?;

    if config.packages.iter().any(|pkg| pkg == IDE_HELPER_PACKAGE) {
        info!("Recording the ide-helper generator in composer scripts");
        let mut manifest = store.load()?;
        manifest.add_script(POST_UPDATE_HOOK, IDE_HELPER_GENERATE)?;
        store.save(&manifest)?;
    }

    Ok(())
}

/// Run the single UI-scaffolding command derived from the configuration.
fn scaffold_ui<R: CommandRunner>(config: &ScaffoldConfig, runner: &R) -> Result<()> {
    if let Some(args) = config.ui_command() {
        info!("Running `{}`", args.join(" "));
        runner.run(&args, COMMAND_TIMEOUT, &mut forward_output)?;
    }
    Ok(())
}

/// Drop this tool's own entry from the manifest.
fn remove_self<M: ManifestStore>(store: &M) -> Result<()> {
    info!("Removing {SELF_PACKAGE} from {}", store.path().display());
    let mut manifest = store.load()?;
    if manifest.remove_requirement(SELF_PACKAGE) {
        store.save(&manifest)?;
    }
    Ok(())
}

/// Final step, always run: let composer apply everything that changed.
fn sync_dependencies<R: CommandRunner>(config: &ScaffoldConfig, runner: &R) -> Result<()> {
    let args = config.composer_argv(&["update"]);
    info!("Running `{}`", args.join(" "));
    runner.run(&args, COMMAND_TIMEOUT, &mut forward_output)?;
    Ok(())
}

/// Pick the provider registration stub: package-specific when exactly one
/// package is installed, combined otherwise.
fn provider_stub(packages: &[String]) -> &'static str {
    match packages {
        [only] if only == DEBUGBAR_PACKAGE => stubs::PROVIDER_DEBUGBAR,
        [only] if only == IDE_HELPER_PACKAGE => stubs::PROVIDER_IDE_HELPER,
        _ => stubs::PROVIDER_ALL,
    }
}

fn forward_output(line: &str) {
    println!("> {line}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_stub_single_debugbar() {
        let packages = vec![DEBUGBAR_PACKAGE.to_string()];
        let stub = provider_stub(&packages);
        assert!(stub.contains("DebugbarServiceProvider"));
        assert!(!stub.contains("IdeHelperServiceProvider"));
    }

    #[test]
    fn test_provider_stub_single_ide_helper() {
        let packages = vec![IDE_HELPER_PACKAGE.to_string()];
        let stub = provider_stub(&packages);
        assert!(stub.contains("IdeHelperServiceProvider"));
        assert!(!stub.contains("DebugbarServiceProvider"));
    }

    #[test]
    fn test_provider_stub_combined() {
        let packages = vec![DEBUGBAR_PACKAGE.to_string(), IDE_HELPER_PACKAGE.to_string()];
        let stub = provider_stub(&packages);
        assert!(stub.contains("DebugbarServiceProvider"));
        assert!(stub.contains("IdeHelperServiceProvider"));
    }
}
