use anyhow::Result;

use crate::prompt;

pub const DEBUGBAR_PACKAGE: &str = "barryvdh/laravel-debugbar";
pub const IDE_HELPER_PACKAGE: &str = "barryvdh/laravel-ide-helper";
/// Composer entry this tool removes from the project when asked to clean up
/// after itself
pub const SELF_PACKAGE: &str = "masterro/laravel-fresh-start";

const DEFAULT_MODELS_DIR: &str = "Models";
const DEFAULT_ABSTRACT_MODEL: &str = "Model";
const DEFAULT_COMPOSER: &str = "composer";
const NO_PRESET: &str = "none";

/// Options gathered from the command line, before resolution
#[derive(Debug, Default, Clone)]
pub struct CliOptions {
    /// Accept every default without prompting
    pub defaults: bool,
    pub models_dir: Option<String>,
    pub abstract_model: Option<String>,
    pub composer: Option<String>,
    pub without_auth: bool,
    pub preset: Option<String>,
    pub without_packages: bool,
    pub keep_package: bool,
}

/// Fully-resolved configuration consumed by the scaffold pipeline.
/// Immutable for the duration of a run; the pipeline never prompts.
#[derive(Debug, Clone)]
pub struct ScaffoldConfig {
    /// Directory under `app/` that will hold the models
    pub models_dir: String,
    /// Class name of the abstract base model
    pub abstract_model: String,
    /// Composer invocation, split on whitespace when building commands
    pub composer_cmd: String,
    /// Dev packages to require, in install order
    pub packages: Vec<String>,
    /// Scaffold authentication
    pub auth: bool,
    /// Frontend preset to scaffold, if any
    pub preset: Option<String>,
    /// Remove this tool's composer entry at the end of the run
    pub remove_self: bool,
}

impl ScaffoldConfig {
    /// Resolve the configuration from CLI options, prompting for anything
    /// not pinned down unless `--defaults` was given.
    ///
    /// # Errors
    ///
    /// Returns an error if reading an interactive answer fails.
    pub fn resolve(options: &CliOptions) -> Result<Self> {
        if options.defaults {
            Ok(Self::from_options(options))
        } else {
            Self::prompted(options)
        }
    }

    fn from_options(options: &CliOptions) -> Self {
        Self {
            models_dir: options
                .models_dir
                .clone()
                .unwrap_or_else(|| DEFAULT_MODELS_DIR.to_string()),
            abstract_model: options
                .abstract_model
                .clone()
                .unwrap_or_else(|| DEFAULT_ABSTRACT_MODEL.to_string()),
            composer_cmd: options
                .composer
                .clone()
                .unwrap_or_else(|| DEFAULT_COMPOSER.to_string()),
            packages: if options.without_packages {
                Vec::new()
            } else {
                vec![DEBUGBAR_PACKAGE.to_string(), IDE_HELPER_PACKAGE.to_string()]
            },
            auth: !options.without_auth,
            preset: options.preset.clone(),
            remove_self: !options.keep_package,
        }
    }

    fn prompted(options: &CliOptions) -> Result<Self> {
        let seeded = Self::from_options(options);

        let models_dir = prompt::ask("Models directory name", &seeded.models_dir)?;
        let abstract_model = prompt::ask("Abstract model name", &seeded.abstract_model)?;
        let composer_cmd = prompt::ask("Composer command", &seeded.composer_cmd)?;

        let mut packages = Vec::new();
        if !options.without_packages {
            for package in [DEBUGBAR_PACKAGE, IDE_HELPER_PACKAGE] {
                if prompt::confirm(&format!("Install {package}?"), true)? {
                    packages.push(package.to_string());
                }
            }
        }

        let auth = if options.without_auth {
            false
        } else {
            prompt::confirm("Scaffold authentication?", true)?
        };

        let preset_default = seeded.preset.as_deref().unwrap_or(NO_PRESET);
        let preset_answer = prompt::ask(
            "Frontend preset (bootstrap, vue, react or none)",
            preset_default,
        )?;
        let preset = if preset_answer == NO_PRESET {
            None
        } else {
            Some(preset_answer)
        };

        let remove_self = if options.keep_package {
            false
        } else {
            prompt::confirm(
                &format!("Remove {SELF_PACKAGE} from composer.json when done?"),
                true,
            )?
        };

        Ok(Self {
            models_dir,
            abstract_model,
            composer_cmd,
            packages,
            auth,
            preset,
            remove_self,
        })
    }

    /// Build a composer argument vector: the configured invocation split on
    /// whitespace (supports `php composer.phar`), followed by `args`.
    #[must_use]
    pub fn composer_argv(&self, args: &[&str]) -> Vec<String> {
        self.composer_cmd
            .split_whitespace()
            .map(str::to_string)
            .chain(args.iter().map(|arg| (*arg).to_string()))
            .collect()
    }

    /// Derive the single UI-scaffolding command from the auth/preset
    /// combination. `None` means the step is skipped entirely.
    #[must_use]
    pub fn ui_command(&self) -> Option<Vec<String>> {
        let artisan = |tail: &[&str]| {
            let mut args = vec!["php".to_string(), "artisan".to_string()];
            args.extend(tail.iter().map(|arg| (*arg).to_string()));
            args
        };

        match (self.preset.as_deref(), self.auth) {
            (None, false) => None,
            (Some(preset), false) => Some(artisan(&["ui", preset])),
            (None, true) => Some(artisan(&["ui:auth"])),
            (Some(preset), true) => Some(artisan(&["ui", preset, "--auth"])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ScaffoldConfig {
        ScaffoldConfig::from_options(&CliOptions {
            defaults: true,
            ..CliOptions::default()
        })
    }

    #[test]
    fn test_defaults() {
        let config = defaults();
        assert_eq!(config.models_dir, "Models");
        assert_eq!(config.abstract_model, "Model");
        assert_eq!(config.composer_cmd, "composer");
        assert_eq!(
            config.packages,
            vec![DEBUGBAR_PACKAGE.to_string(), IDE_HELPER_PACKAGE.to_string()]
        );
        assert!(config.auth);
        assert!(config.preset.is_none());
        assert!(config.remove_self);
    }

    #[test]
    fn test_cli_options_override_defaults() {
        let config = ScaffoldConfig::from_options(&CliOptions {
            defaults: true,
            models_dir: Some("Entities".to_string()),
            composer: Some("php composer.phar".to_string()),
            without_auth: true,
            without_packages: true,
            keep_package: true,
            ..CliOptions::default()
        });

        assert_eq!(config.models_dir, "Entities");
        assert_eq!(config.composer_cmd, "php composer.phar");
        assert!(config.packages.is_empty());
        assert!(!config.auth);
        assert!(!config.remove_self);
    }

    #[test]
    fn test_composer_argv_splits_invocation() {
        let mut config = defaults();
        config.composer_cmd = "php composer.phar".to_string();

        assert_eq!(
            config.composer_argv(&["require", "foo/bar", "--dev"]),
            vec!["php", "composer.phar", "require", "foo/bar", "--dev"]
        );
    }

    #[test]
    fn test_ui_command_neither() {
        let mut config = defaults();
        config.auth = false;
        config.preset = None;
        assert!(config.ui_command().is_none());
    }

    #[test]
    fn test_ui_command_preset_only() {
        let mut config = defaults();
        config.auth = false;
        config.preset = Some("vue".to_string());
        assert_eq!(
            config.ui_command().unwrap(),
            vec!["php", "artisan", "ui", "vue"]
        );
    }

    #[test]
    fn test_ui_command_auth_only() {
        let mut config = defaults();
        config.auth = true;
        config.preset = None;
        assert_eq!(config.ui_command().unwrap(), vec!["php", "artisan", "ui:auth"]);
    }

    #[test]
    fn test_ui_command_preset_and_auth() {
        let mut config = defaults();
        config.auth = true;
        config.preset = Some("bootstrap".to_string());
        assert_eq!(
            config.ui_command().unwrap(),
            vec!["php", "artisan", "ui", "bootstrap", "--auth"]
        );
    }
}
