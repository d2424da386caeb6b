use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Base name of the config file looked up when no path is given (`gpilot.toml`).
pub const DEFAULT_CONFIG_FILE: &str = "gpilot";
/// Prefix of environment overrides: `GPILOT__SITES__MAX_DISABLED=100`.
pub const ENV_PREFIX: &str = "GPILOT";

#[gpilot_derive::gpilot_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads layered configuration: a TOML file overlaid with `GPILOT__` environment variables.
///
/// An explicit `path` must exist. Without one, `gpilot.toml` in the working directory is
/// used when present and built-in defaults apply otherwise.
///
/// # Errors
/// Returns [`ConfigError::Config`] if an explicit file is missing or the merged sources
/// do not match `T`.
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let env = Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true);
    load_layered(path, env)
}

pub(crate) fn load_layered<T>(
    path: Option<impl AsRef<Path>>,
    env: Environment,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let required = path.is_some();
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());

    info!(path = %effective_path.display(), required, "Loading config");

    let config = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(env)
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpilot_domain::config::AppConfig;
    use std::collections::HashMap;
    use std::fs;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true).source(Some(source))
    }

    #[test]
    fn missing_default_file_yields_defaults() {
        let cfg: AppConfig =
            load_layered(None::<&str>, env(&[])).expect("defaults without a config file");
        assert_eq!(cfg.sites.max_disabled, 500);
        assert_eq!(cfg.storage.area, "sync");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_layered::<AppConfig>(Some("/nonexistent/gpilot.toml"), env(&[]))
            .expect_err("required file");
        assert_eq!(err.code(), "config");
        assert!(err.to_string().contains("Failed to build config"));
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gpilot.toml");
        fs::write(
            &path,
            "[sites]\nmax_disabled = 10\n\n[menu]\ngitlab_hosts = [\"code.example.org\"]\n",
        )
        .expect("write config");

        let cfg: AppConfig =
            load_layered(Some(&path), env(&[("GPILOT__SITES__MAX_DISABLED", "3")])).expect("load");
        assert_eq!(cfg.sites.max_disabled, 3);
        assert_eq!(cfg.menu.gitlab_hosts, vec!["code.example.org".to_owned()]);
        assert_eq!(cfg.messaging.reply_timeout_ms, 30_000);
    }
}
