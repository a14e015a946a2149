use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// What to do when a type is registered a second time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail the registration batch.
    #[default]
    Reject,
    /// Replace the earlier descriptor.
    Replace,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(DuplicatePolicy::Reject),
            "replace" => Ok(DuplicatePolicy::Replace),
            other => Err(format!("unknown duplicate policy {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

/// Settings for the cascade engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeSettings {
    /// Primary key field in snapshots, payloads and pull predicates
    /// (default: `_id`)
    pub id_field: String,
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self {
            id_field: "_id".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Create declared indexes when the application starts (default: true)
    pub ensure_on_startup: bool,
    /// Build every index in the background (default: false)
    pub background: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            ensure_on_startup: true,
            background: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, used when `RUST_LOG` is unset.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub cascade: CascadeSettings,
    #[serde(default)]
    pub indexes: IndexConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from TOML file, with environment variable overrides.
    /// Falls back to defaults if file is not found. MONODOC_CONFIG env var overrides the path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        ConfigLoader::new().load(path)
    }

    /// Parse a TOML document without consulting files or the environment.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Resolves configuration from file, CLI args, and environment variables.
struct ConfigLoader {
    args: Vec<String>,
}

impl ConfigLoader {
    fn new() -> Self {
        Self {
            args: env::args().collect(),
        }
    }

    fn load<P: AsRef<Path>>(&self, default_path: P) -> anyhow::Result<Config> {
        let mut cfg_path = self.resolve_config_path(default_path);

        if let Ok(env_path) = env::var("MONODOC_CONFIG") {
            cfg_path = PathBuf::from(env_path);
        }

        let mut cfg = match fs::read_to_string(&cfg_path) {
            Ok(s) => Config::from_toml_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(e.into()),
        };
        Self::apply_env_overrides(&mut cfg, |key| env::var(key).ok())?;
        Ok(cfg)
    }

    fn resolve_config_path<P: AsRef<Path>>(&self, default_path: P) -> PathBuf {
        Self::find_config_arg(&self.args).unwrap_or_else(|| default_path.as_ref().to_path_buf())
    }

    /// Find --config or -c flag in arguments.
    fn find_config_arg(args: &[String]) -> Option<PathBuf> {
        let mut iter = args.iter().peekable();
        while let Some(a) = iter.next() {
            if a.starts_with("--config=") || a.starts_with("-c=") {
                if let Some((_, val)) = a.split_once('=') {
                    return Some(PathBuf::from(val));
                }
            } else if (a == "--config" || a == "-c")
                && let Some(next) = iter.peek()
            {
                return Some(PathBuf::from((*next).clone()));
            }
        }
        None
    }

    /// Apply MONODOC_* environment variable overrides.
    fn apply_env_overrides(
        cfg: &mut Config,
        var: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(v) = var("MONODOC_ID_FIELD") {
            cfg.cascade.id_field = v;
        }

        if let Some(v) = var("MONODOC_DUPLICATE_POLICY") {
            cfg.registry.duplicate_policy = v.parse().map_err(anyhow::Error::msg)?;
        }

        if let Some(v) = var("MONODOC_LOG") {
            cfg.logging.filter = Some(v);
        }

        if let Some(v) = var("MONODOC_ENSURE_INDEXES") {
            cfg.indexes.ensure_on_startup = matches!(v.as_str(), "1" | "true" | "yes" | "on");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_when_sections_are_missing() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg.registry.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(cfg.cascade.id_field, "_id");
        assert!(cfg.indexes.ensure_on_startup);
        assert!(!cfg.indexes.background);
        assert_eq!(cfg.logging.filter, None);
    }

    #[test]
    fn parses_all_sections() {
        let cfg = Config::from_toml_str(
            r#"
            [registry]
            duplicate_policy = "replace"

            [cascade]
            id_field = "uid"

            [indexes]
            ensure_on_startup = false
            background = true

            [logging]
            filter = "monodoc=trace"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.registry.duplicate_policy, DuplicatePolicy::Replace);
        assert_eq!(cfg.cascade.id_field, "uid");
        assert!(!cfg.indexes.ensure_on_startup);
        assert!(cfg.indexes.background);
        assert_eq!(cfg.logging.filter.as_deref(), Some("monodoc=trace"));
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(Config::from_toml_str("[registry]\nduplicate_policy = \"merge\"").is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("MONODOC_ID_FIELD", "key"),
            ("MONODOC_DUPLICATE_POLICY", "Replace"),
            ("MONODOC_ENSURE_INDEXES", "no"),
        ]
        .into_iter()
        .collect();
        let mut cfg = Config::default();
        ConfigLoader::apply_env_overrides(&mut cfg, |k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.cascade.id_field, "key");
        assert_eq!(cfg.registry.duplicate_policy, DuplicatePolicy::Replace);
        assert!(!cfg.indexes.ensure_on_startup);

        let mut bad = Config::default();
        let err = ConfigLoader::apply_env_overrides(&mut bad, |k| {
            (k == "MONODOC_DUPLICATE_POLICY").then(|| "sometimes".to_string())
        });
        assert!(err.is_err());
    }

    #[test]
    fn finds_config_argument() {
        let args: Vec<String> = ["bin", "-c", "a.toml"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            ConfigLoader::find_config_arg(&args),
            Some(PathBuf::from("a.toml"))
        );
        let args = vec!["bin".to_string(), "--config=b.toml".to_string()];
        assert_eq!(
            ConfigLoader::find_config_arg(&args),
            Some(PathBuf::from("b.toml"))
        );
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let loader = ConfigLoader { args: vec![] };
        let cfg = loader.load("/nonexistent/monodoc.toml").unwrap();
        assert_eq!(cfg.cascade.id_field, "_id");
    }
}
