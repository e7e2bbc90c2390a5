//! # Configuration loading: TOML file + environment overrides.
//!
//! [`ConfigLoader`] produces any `DeserializeOwned + PostLoad` value in three steps:
//!
//! ```text
//! 1. file     explicit `with_file`, else picked from APP_ENV:
//!               local            → config.local.toml
//!               dev|development  → config.dev.toml
//!               test|testing     → config.test.toml
//!               staging|stage    → config.staging.toml
//!               prod|production  → config.prod.toml
//!               (anything else)  → config.dev.toml
//!             read from disk, or from the embedded set when one is configured
//! 2. env      PREFIX_SHUTDOWN_TIMEOUT=5s  → shutdown_timeout = "5s"
//!             PREFIX_HTTP__PORT=8080      → http.port = 8080   (`__` nests)
//!             a file key spelled differently (shutdownTimeout) is replaced
//! 3. post     T::post_load() validates/normalizes the merged value
//! ```
//!
//! An explicitly named file must exist. A file derived from `APP_ENV` is optional:
//! when it is missing, only defaults and environment overrides apply.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use toml::{Table, Value};
use tracing::debug;

use crate::error::ConfigError;

/// Environment variable that selects the configuration file.
pub const ENV_SELECTOR: &str = "APP_ENV";

/// Default prefix for environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "APP";

/// Optional hook run once on the merged value, after deserialization.
///
/// Types opt in with `impl PostLoad for MyConfig {}`; override
/// [`post_load`](PostLoad::post_load) to validate or derive fields.
pub trait PostLoad {
    fn post_load(&mut self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Builder-style loader for configuration values.
///
/// ```
/// use serde::Deserialize;
/// use serviceloader::{ConfigLoader, PostLoad};
///
/// #[derive(Deserialize, Default)]
/// #[serde(default)]
/// struct HttpConfig { port: u16 }
/// impl PostLoad for HttpConfig {}
///
/// let cfg: HttpConfig = ConfigLoader::new()
///     .with_embedded("config.dev.toml", "port = 8080")
///     .with_env_vars([("APP_ENV", "dev")])
///     .load()
///     .unwrap();
/// assert_eq!(cfg.port, 8080);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<String>,
    dir: PathBuf,
    embedded: Option<HashMap<String, &'static str>>,
    env_prefix: String,
    env: Option<Vec<(String, String)>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            dir: PathBuf::from("."),
            embedded: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            env: None,
        }
    }

    /// Loads exactly this file (relative names resolve against [`with_dir`](Self::with_dir)).
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Directory used to resolve relative file names. Defaults to the working directory.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Adds a file to the embedded set; once any is embedded, files are never read from disk.
    ///
    /// Pair with `include_str!` to ship configuration inside the binary.
    pub fn with_embedded(mut self, name: impl Into<String>, contents: &'static str) -> Self {
        self.embedded
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), contents);
        self
    }

    /// Prefix of the environment variables that override file values (default `APP`).
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Uses these variables instead of the process environment.
    pub fn with_env_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Loads, merges and post-processes a configuration value.
    pub fn load<T>(&self) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + PostLoad,
    {
        let env = self.env_vars();
        let mut table = self.load_file(&env)?;
        self.apply_env(&mut table, &env)?;

        let mut target: T = Value::Table(table)
            .try_into()
            .map_err(ConfigError::Deserialize)?;
        target.post_load()?;
        Ok(target)
    }

    fn env_vars(&self) -> Vec<(String, String)> {
        match &self.env {
            Some(vars) => vars.clone(),
            None => std::env::vars().collect(),
        }
    }

    /// Picks the file name; the flag tells whether it was named explicitly.
    fn file_name(&self, env: &[(String, String)]) -> (String, bool) {
        if let Some(file) = &self.file {
            return (file.clone(), true);
        }
        let selector = env
            .iter()
            .find(|(k, _)| k == ENV_SELECTOR)
            .map(|(_, v)| v.as_str())
            .unwrap_or("");
        (file_for_env(selector).to_string(), false)
    }

    fn load_file(&self, env: &[(String, String)]) -> Result<Table, ConfigError> {
        let (name, explicit) = self.file_name(env);

        let contents = match &self.embedded {
            Some(files) => match files.get(&name) {
                Some(contents) => (*contents).to_string(),
                None if explicit => {
                    return Err(ConfigError::Io {
                        path: name,
                        source: std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "not in embedded set",
                        ),
                    });
                }
                None => {
                    debug!(file = %name, "no embedded config file; using defaults");
                    return Ok(Table::new());
                }
            },
            None => {
                let path = self.dir.join(&name);
                match std::fs::read_to_string(&path) {
                    Ok(contents) => contents,
                    Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                        debug!(path = %path.display(), "no config file; using defaults");
                        return Ok(Table::new());
                    }
                    Err(source) => {
                        return Err(ConfigError::Io {
                            path: path.display().to_string(),
                            source,
                        });
                    }
                }
            }
        };

        debug!(file = %name, "loading config file");
        contents
            .parse::<Table>()
            .map_err(|source| ConfigError::Parse {
                origin: name,
                source,
            })
    }

    fn apply_env(&self, table: &mut Table, env: &[(String, String)]) -> Result<(), ConfigError> {
        let prefix = format!("{}_", self.env_prefix);

        for (key, raw) in env {
            if key == ENV_SELECTOR {
                continue;
            }
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            let path: Vec<String> = rest
                .split("__")
                .filter(|seg| !seg.is_empty())
                .map(str::to_ascii_lowercase)
                .collect();
            let Some((last, parents)) = path.split_last() else {
                continue;
            };

            let mut node = &mut *table;
            for seg in parents {
                let seg = spelled_as(node, seg);
                let entry = node.entry(seg.clone()).or_insert(Value::Table(Table::new()));
                node = match entry {
                    Value::Table(t) => t,
                    _ => {
                        return Err(ConfigError::InvalidEnv {
                            key: key.clone(),
                            reason: format!("{seg} is not a table"),
                        });
                    }
                };
            }
            debug!(env = %key, "applying environment override");
            let spelled = spelled_as(node, last);
            if spelled != *last {
                node.remove(&spelled);
            }
            node.insert(last.clone(), scalar(raw));
        }
        Ok(())
    }
}

/// Maps an `APP_ENV` value to its configuration file name.
pub fn file_for_env(env: &str) -> &'static str {
    match env {
        "local" => "config.local.toml",
        "dev" | "development" => "config.dev.toml",
        "test" | "testing" => "config.test.toml",
        "staging" | "stage" => "config.staging.toml",
        "prod" | "production" => "config.prod.toml",
        _ => "config.dev.toml",
    }
}

/// Returns the key `node` already uses for `key`, ignoring case, `_` and `-`.
///
/// `shutdownTimeout`, `shutdown-timeout` and `shutdown_timeout` all name the same field.
fn spelled_as(node: &Table, key: &str) -> String {
    let folded = fold_key(key);
    node.keys()
        .find(|k| fold_key(k) == folded)
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Reads an environment value as a TOML scalar, falling back to a string.
fn scalar(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(b) = raw.parse::<bool>() {
        return Value::Boolean(b);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return Value::Float(f);
        }
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Default, Debug)]
    #[serde(default)]
    struct Sample {
        name: String,
        workers: i64,
        http: Http,
    }

    #[derive(Deserialize, Default, Debug)]
    #[serde(default)]
    struct Http {
        port: i64,
        tls: bool,
    }

    impl PostLoad for Sample {
        fn post_load(&mut self) -> Result<(), ConfigError> {
            if self.workers < 0 {
                return Err(ConfigError::PostLoad("workers must not be negative".into()));
            }
            if self.name.is_empty() {
                self.name = "unnamed".into();
            }
            Ok(())
        }
    }

    #[test]
    fn app_env_selects_file() {
        assert_eq!(file_for_env("local"), "config.local.toml");
        assert_eq!(file_for_env("development"), "config.dev.toml");
        assert_eq!(file_for_env("testing"), "config.test.toml");
        assert_eq!(file_for_env("stage"), "config.staging.toml");
        assert_eq!(file_for_env("production"), "config.prod.toml");
        assert_eq!(file_for_env(""), "config.dev.toml");
        assert_eq!(file_for_env("qa"), "config.dev.toml");
    }

    #[test]
    fn reads_file_selected_by_app_env() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("config.prod.toml"),
            "name = \"prod\"\nworkers = 8\n[http]\nport = 443\n",
        )
        .expect("write");

        let cfg: Sample = ConfigLoader::new()
            .with_dir(dir.path())
            .with_env_vars([("APP_ENV", "production")])
            .load()
            .expect("load");

        assert_eq!(cfg.name, "prod");
        assert_eq!(cfg.workers, 8);
        assert_eq!(cfg.http.port, 443);
    }

    #[test]
    fn missing_derived_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg: Sample = ConfigLoader::new()
            .with_dir(dir.path())
            .with_env_vars(Vec::<(String, String)>::new())
            .load()
            .expect("load");
        assert_eq!(cfg.name, "unnamed");
        assert_eq!(cfg.workers, 0);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ConfigLoader::new()
            .with_dir(dir.path())
            .with_file("nope.toml")
            .with_env_vars(Vec::<(String, String)>::new())
            .load::<Sample>()
            .expect_err("must fail");
        assert_eq!(err.as_label(), "config_io");
    }

    #[test]
    fn env_overrides_file_values() {
        let cfg: Sample = ConfigLoader::new()
            .with_embedded("config.dev.toml", "name = \"dev\"\nworkers = 2\n[http]\nport = 80\n")
            .with_env_vars([
                ("APP_WORKERS", "16"),
                ("APP_HTTP__PORT", "8080"),
                ("APP_HTTP__TLS", "true"),
                ("OTHER_WORKERS", "99"),
            ])
            .load()
            .expect("load");

        assert_eq!(cfg.name, "dev");
        assert_eq!(cfg.workers, 16);
        assert_eq!(cfg.http.port, 8080);
        assert!(cfg.http.tls);
    }

    #[test]
    fn env_prefix_is_configurable() {
        let cfg: Sample = ConfigLoader::new()
            .with_embedded("config.dev.toml", "")
            .with_env_prefix("SVC")
            .with_env_vars([("SVC_NAME", "gateway"), ("APP_NAME", "ignored")])
            .load()
            .expect("load");
        assert_eq!(cfg.name, "gateway");
    }

    #[test]
    fn env_cannot_descend_into_scalars() {
        let err = ConfigLoader::new()
            .with_embedded("config.dev.toml", "workers = 1")
            .with_env_vars([("APP_WORKERS__COUNT", "3")])
            .load::<Sample>()
            .expect_err("must fail");
        assert_eq!(err.as_label(), "config_invalid_env");
    }

    #[test]
    fn parse_and_post_load_errors_surface() {
        let err = ConfigLoader::new()
            .with_embedded("config.dev.toml", "workers = [")
            .with_env_vars(Vec::<(String, String)>::new())
            .load::<Sample>()
            .expect_err("must fail");
        assert_eq!(err.as_label(), "config_parse");

        let err = ConfigLoader::new()
            .with_embedded("config.dev.toml", "workers = -1")
            .with_env_vars(Vec::<(String, String)>::new())
            .load::<Sample>()
            .expect_err("must fail");
        assert_eq!(err.as_label(), "config_post_load");
    }

    #[test]
    fn env_override_replaces_other_spellings_of_a_key() {
        let mut table: Table = "maxWorkers = 2\n[Http]\nport = 80\n"
            .parse()
            .expect("toml");
        ConfigLoader::new()
            .apply_env(
                &mut table,
                &[
                    ("APP_MAX_WORKERS".to_string(), "4".to_string()),
                    ("APP_HTTP__PORT".to_string(), "8080".to_string()),
                ],
            )
            .expect("apply");

        assert_eq!(table.get("maxWorkers"), None);
        assert_eq!(table.get("max_workers"), Some(&Value::Integer(4)));
        assert_eq!(table.get("http"), None);
        assert_eq!(table["Http"].get("port"), Some(&Value::Integer(8080)));
    }

    #[test]
    fn scalars_keep_their_type() {
        assert_eq!(scalar("42"), Value::Integer(42));
        assert_eq!(scalar("false"), Value::Boolean(false));
        assert_eq!(scalar("0.5"), Value::Float(0.5));
        assert_eq!(scalar("10s"), Value::String("10s".into()));
        assert_eq!(scalar("inf"), Value::String("inf".into()));
    }
}
