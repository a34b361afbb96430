//! Layered configuration loading.
//!
//! The effective configuration is built from, in increasing precedence:
//! defaults, `~/.kinship/config.toml`, `.kinship/config.toml` under the
//! working directory, and command-line overrides. An explicit file passed
//! with `--config` stands in for both files.

use crate::error::ConfigError;
use crate::{
    AggregatorConfig, ConfigOverrides, EntitySourceConfig, KinshipConfig, LoggingConfig,
    RelationshipSourceConfig, StorageConfig,
};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

const CONFIG_FILE_NAME: &str = "config.toml";

const CONFIG_DIR: &str = ".kinship";

/// Which configuration file a loader operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    /// `~/.kinship/config.toml`
    Global,
    /// `.kinship/config.toml` under the working directory
    Local,
}

impl ConfigScope {
    /// Files in merge order.
    pub const LAYERS: [ConfigScope; 2] = [ConfigScope::Global, ConfigScope::Local];
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Global => "global",
            Self::Local => "local",
        })
    }
}

/// Resolves, reads and writes configuration files.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Directory of the global file, `None` without a home directory
    global_dir: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader whose global file lives under the home directory.
    pub fn new() -> Self {
        Self {
            global_dir: dirs::home_dir().map(|home| home.join(CONFIG_DIR)),
        }
    }

    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_dir: Some(global_dir.into()),
        }
    }

    /// The `scope` file for a working directory.
    pub fn path(&self, scope: ConfigScope, root: &Path) -> Option<PathBuf> {
        match scope {
            ConfigScope::Global => self.global_dir.as_ref().map(|d| d.join(CONFIG_FILE_NAME)),
            ConfigScope::Local => Some(Self::local_path(root)),
        }
    }

    pub fn local_path(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Read one file. A missing file, or a missing home directory, is `None`.
    pub fn read(
        &self,
        scope: ConfigScope,
        root: &Path,
    ) -> Result<Option<KinshipConfig>, ConfigError> {
        let Some(path) = self.path(scope, root) else {
            debug!("No home directory found, skipping {} config", scope);
            return Ok(None);
        };
        if !path.exists() {
            trace!("No {} config at {:?}", scope, path);
            return Ok(None);
        }

        debug!("Reading {} config from {:?}", scope, path);
        read_file(&path).map(Some)
    }

    /// The effective configuration for `root`, validated.
    pub fn load(
        &self,
        root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<KinshipConfig, ConfigError> {
        let mut config = KinshipConfig::default();
        for scope in ConfigScope::LAYERS {
            if let Some(layer) = self.read(scope, root)? {
                config = merge_configs(config, layer);
            }
        }
        finish(config, overrides)
    }

    /// The configuration of one explicit file over the defaults, validated.
    pub fn load_file(
        &self,
        path: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<KinshipConfig, ConfigError> {
        debug!("Reading config from {:?}", path);
        finish(merge_configs(KinshipConfig::default(), read_file(path)?), overrides)
    }

    /// Write `config` to the `scope` file, replacing its contents.
    pub fn save(
        &self,
        scope: ConfigScope,
        root: &Path,
        config: &KinshipConfig,
    ) -> Result<PathBuf, ConfigError> {
        let path = self.path(scope, root).ok_or(ConfigError::NoHomeDir)?;
        write_file(&path, config)?;
        Ok(path)
    }

    /// Write a default `scope` file unless one already exists.
    pub fn init(&self, scope: ConfigScope, root: &Path) -> Result<PathBuf, ConfigError> {
        let path = self.path(scope, root).ok_or(ConfigError::NoHomeDir)?;
        if path.exists() {
            debug!("Keeping existing {} config {:?}", scope, path);
        } else {
            write_file(&path, &KinshipConfig::default())?;
        }
        Ok(path)
    }
}

fn finish(
    mut config: KinshipConfig,
    overrides: Option<&ConfigOverrides>,
) -> Result<KinshipConfig, ConfigError> {
    if let Some(ovr) = overrides {
        config.apply_overrides(ovr);
    }
    config.validate()?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<KinshipConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

fn write_file(path: &Path, config: &KinshipConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.exists()) {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Pick `overlay` when it differs from the default, otherwise keep `base`.
fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

/// Merge two configurations, with `overlay` taking precedence field by field.
fn merge_configs(base: KinshipConfig, overlay: KinshipConfig) -> KinshipConfig {
    KinshipConfig {
        storage: merge_storage(base.storage, overlay.storage),
        aggregator: merge_aggregator(base.aggregator, overlay.aggregator),
        relationships: merge_relationships(base.relationships, overlay.relationships),
        entities: merge_entities(base.entities, overlay.entities),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

fn merge_storage(base: StorageConfig, overlay: StorageConfig) -> StorageConfig {
    let default = StorageConfig::default();
    StorageConfig {
        data_dir: pick(base.data_dir, overlay.data_dir, default.data_dir),
        database: pick(base.database, overlay.database, default.database),
    }
}

fn merge_aggregator(base: AggregatorConfig, overlay: AggregatorConfig) -> AggregatorConfig {
    AggregatorConfig {
        drain_page_size: pick(
            base.drain_page_size,
            overlay.drain_page_size,
            AggregatorConfig::default().drain_page_size,
        ),
        timeout_secs: overlay.timeout_secs.or(base.timeout_secs),
    }
}

fn merge_relationships(
    base: RelationshipSourceConfig,
    overlay: RelationshipSourceConfig,
) -> RelationshipSourceConfig {
    let default = RelationshipSourceConfig::default();
    RelationshipSourceConfig {
        min_page_size: pick(base.min_page_size, overlay.min_page_size, default.min_page_size),
        max_page_size: pick(base.max_page_size, overlay.max_page_size, default.max_page_size),
        cursor_prefix: pick(base.cursor_prefix, overlay.cursor_prefix, default.cursor_prefix),
    }
}

fn merge_entities(base: EntitySourceConfig, overlay: EntitySourceConfig) -> EntitySourceConfig {
    let default = EntitySourceConfig::default();
    EntitySourceConfig {
        min_page_size: pick(base.min_page_size, overlay.min_page_size, default.min_page_size),
        max_page_size: pick(base.max_page_size, overlay.max_page_size, default.max_page_size),
        cursor_prefix: pick(base.cursor_prefix, overlay.cursor_prefix, default.cursor_prefix),
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    LoggingConfig {
        level: pick(base.level, overlay.level, LoggingConfig::default().level),
        format: pick(base.format, overlay.format, LoggingConfig::default().format),
        file: overlay.file.or(base.file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogFormat;
    use tempfile::TempDir;

    fn write_local_config(content: &str, dir: &Path) -> PathBuf {
        let config_dir = dir.join(".kinship");
        std::fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn write_global_config(content: &str, dir: &Path) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("config.toml"), content).unwrap();
    }

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config, KinshipConfig::default());
    }

    #[test]
    fn test_load_local_config() {
        let temp = TempDir::new().unwrap();
        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        write_local_config(
            r#"
            [storage]
            database = "local.db"

            [entities]
            max_page_size = 250
            "#,
            temp.path(),
        );

        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config.storage.database, PathBuf::from("local.db"));
        assert_eq!(config.entities.max_page_size, 250);
        assert_eq!(config.entities.cursor_prefix, "id:");
    }

    #[test]
    fn test_local_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");

        write_global_config(
            r#"
            [logging]
            level = "debug"

            [aggregator]
            drain_page_size = 500
            "#,
            &global_dir,
        );
        write_local_config(
            r#"
            [aggregator]
            drain_page_size = 200
            "#,
            temp.path(),
        );

        let loader = ConfigLoader::with_global_dir(&global_dir);
        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config.aggregator.drain_page_size, 200);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_global_log_format_survives_local_config() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");

        write_global_config(
            r#"
            [logging]
            format = "json"
            "#,
            &global_dir,
        );
        write_local_config(
            r#"
            [storage]
            database = "x.db"
            "#,
            temp.path(),
        );

        let loader = ConfigLoader::with_global_dir(&global_dir);
        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.storage.database, PathBuf::from("x.db"));
    }

    #[test]
    fn test_cli_overrides_all() {
        let temp = TempDir::new().unwrap();
        write_local_config(
            r#"
            [aggregator]
            timeout_secs = 30
            "#,
            temp.path(),
        );

        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let overrides = ConfigOverrides {
            timeout_secs: Some(3),
            log_level: Some("trace".to_string()),
            ..Default::default()
        };

        let config = loader.load(temp.path(), Some(&overrides)).unwrap();

        assert_eq!(config.aggregator.timeout_secs, Some(3));
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_invalid_merged_config_is_rejected() {
        let temp = TempDir::new().unwrap();
        write_local_config(
            r#"
            [relationships]
            min_page_size = 0
            "#,
            temp.path(),
        );

        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let err = loader.load(temp.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_malformed_toml_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = write_local_config("[aggregator\n", temp.path());

        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let err = loader.load(temp.path(), None).unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_load_file_explicit() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let config = loader.load_file(&path, None).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        let mut config = KinshipConfig::default();
        config.relationships.max_page_size = 300;
        config.logging.level = "warn".to_string();
        let path = loader.save(ConfigScope::Local, temp.path(), &config).unwrap();
        assert_eq!(path, temp.path().join(".kinship/config.toml"));

        let loaded = loader.load(temp.path(), None).unwrap();

        assert_eq!(loaded.relationships.max_page_size, 300);
        assert_eq!(loaded.logging.level, "warn");
    }

    #[test]
    fn test_init_local_creates_config() {
        let temp = TempDir::new().unwrap();
        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        let config_path = loader.init(ConfigScope::Local, temp.path()).unwrap();

        assert!(config_path.exists());
        assert!(config_path.ends_with(".kinship/config.toml"));

        let content = std::fs::read_to_string(&config_path).unwrap();
        let _: KinshipConfig = toml::from_str(&content).unwrap();
    }

    #[test]
    fn test_init_global_keeps_existing() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");
        write_global_config("[logging]\nlevel = \"error\"\n", &global_dir);

        let loader = ConfigLoader::with_global_dir(&global_dir);
        let path = loader.init(ConfigScope::Global, temp.path()).unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("error"));
    }

    #[test]
    fn test_merge_keeps_base_when_overlay_is_default() {
        let base = KinshipConfig {
            entities: EntitySourceConfig {
                cursor_prefix: "user:".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = merge_configs(base, KinshipConfig::default());
        assert_eq!(merged.entities.cursor_prefix, "user:");
    }

    #[test]
    fn test_global_scope_without_home_is_skipped_or_refused() {
        let temp = TempDir::new().unwrap();
        let loader = ConfigLoader {
            global_dir: None,
        };

        assert_eq!(loader.path(ConfigScope::Global, temp.path()), None);
        assert_eq!(loader.read(ConfigScope::Global, temp.path()).unwrap(), None);
        assert!(matches!(
            loader.init(ConfigScope::Global, temp.path()),
            Err(ConfigError::NoHomeDir)
        ));
        assert_eq!(loader.load(temp.path(), None).unwrap(), KinshipConfig::default());
    }
}
