//! # PMOBrowser Configuration Module
//!
//! Gestion de la configuration de PMOBrowser :
//! - configuration par défaut embarquée (`pmobrowser.yaml`)
//! - fusion avec `<config_dir>/config.yaml`
//! - surcharges par variables d'environnement `PMOBROWSER_CONFIG__SECTION__KEY`
//! - getters/setters typés avec valeur par défaut
//!
//! There is no global instance: the application loads one [`Config`] at
//! startup and hands it (usually behind an `Arc`) to whatever needs it.
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::Config;
//!
//! let config = Config::load_config("")?;
//!
//! let level = config.get_log_min_level()?;
//! let detect_moves = config.get_diff_detect_moves()?;
//!
//! config.set_browser_root_id("/library".to_string())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{debug, info, warn};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmobrowser.yaml");
const CONFIG_FILE_NAME: &str = "config.yaml";

const ENV_CONFIG_DIR: &str = "PMOBROWSER_CONFIG";
const ENV_PREFIX: &str = "PMOBROWSER_CONFIG__";
const DEFAULT_DIR_NAME: &str = ".pmobrowser";

/// Scalar types readable from and writable to the YAML tree.
pub trait ConfigValue: Sized {
    /// `None` when `value` has the wrong shape; the caller falls back to
    /// the default.
    fn from_yaml(value: &Value) -> Option<Self>;
    fn to_yaml(self) -> Value;
}

impl ConfigValue for bool {
    fn from_yaml(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn to_yaml(self) -> Value {
        Value::Bool(self)
    }
}

impl ConfigValue for usize {
    fn from_yaml(value: &Value) -> Option<Self> {
        value.as_u64().and_then(|n| usize::try_from(n).ok())
    }

    fn to_yaml(self) -> Value {
        Value::Number((self as u64).into())
    }
}

/// Empty strings count as unset.
impl ConfigValue for String {
    fn from_yaml(value: &Value) -> Option<Self> {
        value.as_str().filter(|s| !s.is_empty()).map(str::to_string)
    }

    fn to_yaml(self) -> Value {
        Value::String(self)
    }
}

/// Génère un getter et un setter typés pour une clé de configuration
macro_rules! config_entry {
    ($getter:ident, $setter:ident, $ty:ty, [$($key:literal),+], $default:expr) => {
        pub fn $getter(&self) -> Result<$ty> {
            Ok(self.get_or(&[$($key),+], $default))
        }

        pub fn $setter(&self, value: $ty) -> Result<()> {
            self.set_value(&[$($key),+], value.to_yaml())
        }
    };
}

/// Configuration manager for PMOBrowser
///
/// Holds the merged YAML tree; every setter writes the whole tree back to
/// `config.yaml`.
#[derive(Debug)]
pub struct Config {
    config_dir: PathBuf,
    path: PathBuf,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(self.data.lock().unwrap().clone()),
        }
    }
}

impl Config {
    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PMOBROWSER_CONFIG` environment variable
    /// 3. `.pmobrowser` in the current directory
    /// 4. `.pmobrowser` in the user's home directory
    ///
    /// If none applies, `./.pmobrowser` is used. The directory is created if
    /// needed and must be writable.
    pub fn resolve_config_dir(directory: &str) -> Result<PathBuf> {
        let dir = pick_config_dir(directory);
        ensure_writable_dir(&dir)
            .with_context(|| format!("Unusable config directory {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads the configuration found in `directory` (see
    /// [`resolve_config_dir`](Self::resolve_config_dir)).
    ///
    /// Embedded defaults are merged with `config.yaml` when it exists, keys
    /// are lower-cased, env overrides applied, and the result saved back.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::resolve_config_dir(directory)?;
        let path = config_dir.join(CONFIG_FILE_NAME);
        info!(config_dir = %config_dir.display(), "Using config directory");

        // Les deux arbres sont normalisés avant la fusion
        let mut tree = lowercase_keys(serde_yaml::from_str(DEFAULT_CONFIG)?);
        match fs::read_to_string(&path) {
            Ok(text) => {
                info!(config_file = %path.display(), "Loaded config file");
                let external: Value = serde_yaml::from_str(&text)
                    .with_context(|| format!("Invalid YAML in {}", path.display()))?;
                merge_yaml(&mut tree, &lowercase_keys(external));
            }
            Err(_) => {
                info!(config_file = %path.display(), "Config file not found, using defaults");
            }
        }

        apply_env_overrides(&mut tree, env::vars());

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(tree),
        };
        config.save()?;
        Ok(config)
    }

    /// Directory holding `config.yaml`.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Writes the current tree to `config.yaml`.
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.data.lock().unwrap())?;
        fs::write(&self.path, yaml)
            .with_context(|| format!("Cannot write {}", self.path.display()))?;
        Ok(())
    }

    /// Sets the value at `path` (e.g. `&["browser", "root_id"]`), creating
    /// intermediate sections, then saves.
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        insert_at(&mut self.data.lock().unwrap(), path, value)?;
        self.save()
    }

    /// Value at `path`; an error if any key along the way is missing.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        lookup(&self.data.lock().unwrap(), path).cloned()
    }

    /// Typed value at `path`, or `default` when missing or ill-typed.
    pub fn get_or<T: ConfigValue>(&self, path: &[&str], default: impl Into<T>) -> T {
        let data = self.data.lock().unwrap();
        match lookup(&data, path) {
            Ok(value) => T::from_yaml(value).unwrap_or_else(|| {
                debug!(key = %path.join("."), "Ill-typed config value, using default");
                default.into()
            }),
            Err(_) => default.into(),
        }
    }

    config_entry!(get_log_cache_size, set_log_cache_size, usize,
        ["host", "logger", "buffer_capacity"], 1000usize);

    config_entry!(get_log_enable_console, set_log_enable_console, bool,
        ["host", "logger", "enable_console"], true);

    config_entry!(get_log_min_level, set_log_min_level, String,
        ["host", "logger", "min_level"], "INFO");

    config_entry!(get_diff_detect_moves, set_diff_detect_moves, bool,
        ["diff", "detect_moves"], true);

    config_entry!(get_browser_service_name, set_browser_service_name, String,
        ["browser", "service_name"], "MusicService");

    config_entry!(get_browser_root_id, set_browser_root_id, String,
        ["browser", "root_id"], "/");
}

fn pick_config_dir(directory: &str) -> PathBuf {
    if !directory.is_empty() {
        return PathBuf::from(directory);
    }
    if let Ok(from_env) = env::var(ENV_CONFIG_DIR) {
        info!(env_var = ENV_CONFIG_DIR, path = %from_env, "Config directory from env");
        return PathBuf::from(from_env);
    }
    let local = PathBuf::from(DEFAULT_DIR_NAME);
    let in_home = home_dir().map(|home| home.join(DEFAULT_DIR_NAME));
    [Some(local.clone()), in_home]
        .into_iter()
        .flatten()
        .find(|candidate| candidate.is_dir())
        .unwrap_or(local)
}

fn ensure_writable_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let probe = dir.join(".write_test");
    fs::write(&probe, b"pmobrowser")?;
    fs::remove_file(&probe)?;
    Ok(())
}

fn key(name: &str) -> Value {
    Value::String(name.to_lowercase())
}

fn lookup<'a>(tree: &'a Value, path: &[&str]) -> Result<&'a Value> {
    path.iter().enumerate().try_fold(tree, |node, (depth, name)| {
        let section = node
            .as_mapping()
            .ok_or_else(|| anyhow!("{} is not a section", path[..depth].join(".")))?;
        section
            .get(&key(name))
            .ok_or_else(|| anyhow!("Path {} does not exist", path[..=depth].join(".")))
    })
}

fn insert_at(tree: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        *tree = value;
        return Ok(());
    };
    let mut node = tree;
    for name in parents {
        let section = node
            .as_mapping_mut()
            .ok_or_else(|| anyhow!("Cannot descend into {name}: parent is not a section"))?;
        node = section
            .entry(key(name))
            .or_insert(Value::Mapping(Mapping::new()));
    }
    node.as_mapping_mut()
        .ok_or_else(|| anyhow!("Cannot set {last}: parent is not a section"))?
        .insert(key(last), value);
    Ok(())
}

/// `PMOBROWSER_CONFIG__HOST__LOGGER__MIN_LEVEL=debug` sets
/// `host.logger.min_level`. Values are parsed as YAML scalars.
fn apply_env_overrides(tree: &mut Value, vars: impl IntoIterator<Item = (String, String)>) {
    for (name, raw) in vars {
        let Some(suffix) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<&str> = suffix.split("__").collect();
        let value = serde_yaml::from_str::<Value>(&raw).unwrap_or(Value::String(raw.clone()));
        match insert_at(tree, &path, value) {
            Ok(()) => debug!(env_var = %name, "Config override applied"),
            Err(err) => warn!(env_var = %name, error = %err, "Ignoring config override"),
        }
    }
}

/// Keys differing only by case end up merged into one section.
fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut lowered = Mapping::new();
            for (k, v) in map {
                let k = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                let v = lowercase_keys(v);
                match lowered.get_mut(&k) {
                    Some(existing) => merge_yaml(existing, &v),
                    None => {
                        lowered.insert(k, v);
                    }
                }
            }
            Value::Mapping(lowered)
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

/// Fusionne `external` dans `base` : les sections sont fusionnées clé par
/// clé, scalaires et séquences sont remplacés.
fn merge_yaml(base: &mut Value, external: &Value) {
    match (base, external) {
        (Value::Mapping(base_map), Value::Mapping(ext_map)) => {
            for (k, v) in ext_map {
                if let Some(existing) = base_map.get_mut(k) {
                    merge_yaml(existing, v);
                } else {
                    base_map.insert(k.clone(), v.clone());
                }
            }
        }
        (slot, replacement) => *slot = replacement.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_in(dir: &tempfile::TempDir) -> Config {
        Config::load_config(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);

        assert_eq!(config.get_log_min_level().unwrap(), "INFO");
        assert!(config.get_log_enable_console().unwrap());
        assert_eq!(config.get_log_cache_size().unwrap(), 1000);
        assert!(config.get_diff_detect_moves().unwrap());
        assert_eq!(config.get_browser_service_name().unwrap(), "MusicService");
        assert_eq!(config.get_browser_root_id().unwrap(), "/");
        assert!(dir.path().join("config.yaml").exists());
        assert_eq!(config.config_dir(), dir.path());
    }

    #[test]
    fn test_external_file_is_merged() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "Diff:\n  Detect_Moves: false\nbrowser:\n  root_id: /library\n",
        )
        .unwrap();

        let config = load_in(&dir);
        assert!(!config.get_diff_detect_moves().unwrap());
        assert_eq!(config.get_browser_root_id().unwrap(), "/library");
        // Les clés absentes gardent leur valeur par défaut
        assert_eq!(config.get_browser_service_name().unwrap(), "MusicService");
    }

    #[test]
    fn test_mixed_case_section_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), "Browser:\n  Root_Id: /lib\n").unwrap();

        let config = load_in(&dir);
        assert_eq!(config.get_browser_root_id().unwrap(), "/lib");
        assert_eq!(
            config.get_value(&["browser", "service_name"]).unwrap(),
            Value::String("MusicService".into())
        );

        // Le fichier réécrit contient l'arbre complet
        let reloaded = load_in(&dir);
        assert_eq!(reloaded.get_browser_service_name().unwrap(), "MusicService");
        assert_eq!(reloaded.get_browser_root_id().unwrap(), "/lib");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), "browser: [unclosed\n").unwrap();
        assert!(Config::load_config(dir.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_set_value_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);
        config.set_log_min_level("DEBUG".to_string()).unwrap();
        config.set_log_cache_size(42).unwrap();

        let reloaded = load_in(&dir);
        assert_eq!(reloaded.get_log_min_level().unwrap(), "DEBUG");
        assert_eq!(reloaded.get_log_cache_size().unwrap(), 42);
    }

    #[test]
    fn test_ill_typed_values_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);
        config
            .set_value(&["diff", "detect_moves"], Value::String("sometimes".into()))
            .unwrap();
        config.set_browser_root_id(String::new()).unwrap();
        assert!(config.get_diff_detect_moves().unwrap());
        assert_eq!(config.get_browser_root_id().unwrap(), "/");
    }

    #[test]
    fn test_get_value_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);
        assert!(config.get_value(&["nope", "missing"]).is_err());
        assert!(config.get_value(&["browser", "root_id", "deeper"]).is_err());
        assert_eq!(
            config.get_value(&["Browser", "Root_Id"]).unwrap(),
            Value::String("/".into())
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut tree: Value = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        apply_env_overrides(
            &mut tree,
            vec![
                ("PMOBROWSER_CONFIG__DIFF__DETECT_MOVES".to_string(), "false".to_string()),
                ("PMOBROWSER_CONFIG__TESTONLY__NAME".to_string(), "demo".to_string()),
                ("PMOBROWSER_CONFIG__BROWSER__ROOT_ID__X".to_string(), "1".to_string()),
                ("UNRELATED".to_string(), "1".to_string()),
            ],
        );
        assert_eq!(lookup(&tree, &["diff", "detect_moves"]).unwrap(), &Value::Bool(false));
        assert_eq!(
            lookup(&tree, &["testonly", "name"]).unwrap(),
            &Value::String("demo".into())
        );
        // root_id est un scalaire : la surcharge imbriquée est ignorée
        assert_eq!(
            lookup(&tree, &["browser", "root_id"]).unwrap(),
            &Value::String("/".into())
        );
    }

    #[test]
    fn test_merge_yaml_replaces_scalars() {
        let mut base: Value = serde_yaml::from_str("a:\n  b: 1\n  c: [1, 2]\n").unwrap();
        let ext: Value = serde_yaml::from_str("a:\n  c: [3]\n  d: x\n").unwrap();
        merge_yaml(&mut base, &ext);
        let expected: Value = serde_yaml::from_str("a:\n  b: 1\n  c: [3]\n  d: x\n").unwrap();
        assert_eq!(base, expected);
    }

    #[test]
    fn test_lowercase_keys() {
        let tree: Value = serde_yaml::from_str("Host:\n  Logger:\n    MIN_LEVEL: WARN\n").unwrap();
        let tree = lowercase_keys(tree);
        assert_eq!(
            lookup(&tree, &["host", "logger", "min_level"]).unwrap(),
            &Value::String("WARN".into())
        );

        let tree: Value = serde_yaml::from_str("Diff:\n  A: 1\ndiff:\n  b: 2\n").unwrap();
        let tree = lowercase_keys(tree);
        assert_eq!(lookup(&tree, &["diff", "a"]).unwrap(), &Value::Number(1.into()));
        assert_eq!(lookup(&tree, &["diff", "b"]).unwrap(), &Value::Number(2.into()));
    }
}
