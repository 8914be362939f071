//! Process-wide configuration store with lazy `{KEY}` interpolation.
//!
//! Values are loaded once, as plain strings, from built-in defaults
//! overlaid by a user TOML file and the process environment. Interpolation
//! of `{KEY}` references is deliberately *not* performed at load time: a
//! fully-resolved snapshot would have to re-run every time an upstream key
//! changed, and the source this is modeled on resolves lazily on every
//! access instead. See [`Config::get`].

pub mod defaults;

use std::collections::HashMap;
use std::path::Path;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use regex::Regex;
use std::sync::OnceLock;

use crate::errors::{CoreError, CoreResult};

use defaults::{DEFAULTS_TOML, MAX_INTERPOLATION_DEPTH, RECOGNIZED_KEYS};

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("static interpolation regex"))
}

/// A resolved, read-only configuration view.
///
/// Cheaply `Clone`-able (an `Arc`-free `HashMap` clone is fine at the sizes
/// involved here, a few dozen keys) so it can be handed to every component
/// without a shared-ownership wrapper.
#[derive(Debug, Clone)]
pub struct Config {
    raw: HashMap<String, String>,
}

impl Config {
    /// Load defaults, then overlay an optional user TOML file, then
    /// environment variables prefixed `MEDIAWATCH_` (e.g.
    /// `MEDIAWATCH_WEB_PORT=9090`).
    pub fn load(user_file: Option<&Path>) -> CoreResult<Self> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULTS_TOML));
        if let Some(path) = user_file {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }
        figment = figment.merge(Env::prefixed("MEDIAWATCH_"));

        let raw: HashMap<String, String> = figment.extract()?;
        Ok(Self { raw })
    }

    /// Build a `Config` directly from a map, bypassing file/env loading.
    /// Used by tests and by the Timeline CLI's `--` passthrough overrides.
    pub fn from_map(raw: HashMap<String, String>) -> Self {
        Self { raw }
    }

    /// Resolve `key`, recursively substituting any `{OTHER_KEY}` references
    /// found in its raw value. Fails with [`CoreError::ConfigCyclic`] once
    /// the substitution chain exceeds [`MAX_INTERPOLATION_DEPTH`].
    pub fn get(&self, key: &str) -> CoreResult<String> {
        if !RECOGNIZED_KEYS.contains(&key) && !self.raw.contains_key(key) {
            return Err(CoreError::ConfigUnknown(key.to_string()));
        }
        self.resolve(key, 0)
    }

    fn resolve(&self, key: &str, depth: u32) -> CoreResult<String> {
        if depth > MAX_INTERPOLATION_DEPTH {
            return Err(CoreError::ConfigCyclic {
                key: key.to_string(),
                max_depth: MAX_INTERPOLATION_DEPTH,
            });
        }
        let raw_value = self
            .raw
            .get(key)
            .ok_or_else(|| CoreError::ConfigUnknown(key.to_string()))?
            .clone();

        let mut result = String::with_capacity(raw_value.len());
        let mut last_end = 0;
        for caps in key_pattern().captures_iter(&raw_value) {
            let whole = caps.get(0).expect("capture group 0 always present");
            let referenced = &caps[1];
            result.push_str(&raw_value[last_end..whole.start()]);
            result.push_str(&self.resolve(referenced, depth + 1)?);
            last_end = whole.end();
        }
        result.push_str(&raw_value[last_end..]);
        Ok(result)
    }

    pub fn get_u32(&self, key: &str) -> CoreResult<u32> {
        let value = self.get(key)?;
        value
            .parse()
            .map_err(|_| CoreError::Internal(format!("config key {key} is not a u32: '{value}'")))
    }

    pub fn get_u64(&self, key: &str) -> CoreResult<u64> {
        let value = self.get(key)?;
        value
            .parse()
            .map_err(|_| CoreError::Internal(format!("config key {key} is not a u64: '{value}'")))
    }

    pub fn get_f64(&self, key: &str) -> CoreResult<f64> {
        let value = self.get(key)?;
        value
            .parse()
            .map_err(|_| CoreError::Internal(format!("config key {key} is not an f64: '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(pairs: &[(&str, &str)]) -> Config {
        let mut raw = HashMap::new();
        for (k, v) in pairs {
            raw.insert(k.to_string(), v.to_string());
        }
        Config::from_map(raw)
    }

    #[test]
    fn resolves_single_reference() {
        let c = cfg(&[("PROJECT_DIR", "/opt/mediawatch"), ("WEB_ROOTDIR", "{PROJECT_DIR}/web")]);
        assert_eq!(c.get("WEB_ROOTDIR").unwrap(), "/opt/mediawatch/web");
    }

    #[test]
    fn resolves_nested_references() {
        let c = cfg(&[
            ("A", "{B}"),
            ("B", "{C}"),
            ("C", "leaf"),
        ]);
        assert_eq!(c.get("A").unwrap(), "leaf");
    }

    #[test]
    fn detects_cycle() {
        let c = cfg(&[("A", "{B}"), ("B", "{A}")]);
        let err = c.get("A").unwrap_err();
        assert!(matches!(err, CoreError::ConfigCyclic { .. }));
    }

    #[test]
    fn detects_deep_chain_as_cyclic() {
        // 10 link chain exceeds the depth-8 guard even without a true cycle.
        let mut raw = HashMap::new();
        for i in 0..10 {
            raw.insert(format!("K{i}"), format!("{{K{}}}", i + 1));
        }
        raw.insert("K10".to_string(), "leaf".to_string());
        let c = Config::from_map(raw);
        assert!(matches!(c.get("K0"), Err(CoreError::ConfigCyclic { .. })));
    }

    #[test]
    fn unknown_key_errors() {
        let c = cfg(&[]);
        assert!(matches!(c.get("NOT_A_KEY"), Err(CoreError::ConfigUnknown(_))));
    }

    // `Config::load` reads the real process environment, so this and any
    // other env-var-mutating test in the crate must not interleave.
    #[test]
    #[serial_test::serial]
    fn load_overlays_prefixed_env_vars_over_defaults() {
        std::env::set_var("MEDIAWATCH_WEB_PORT", "9123");
        let config = Config::load(None).unwrap();
        assert_eq!(config.get("WEB_PORT").unwrap(), "9123");
        std::env::remove_var("MEDIAWATCH_WEB_PORT");
    }

    #[test]
    #[serial_test::serial]
    fn load_falls_back_to_defaults_without_env_override() {
        std::env::remove_var("MEDIAWATCH_WEB_PORT");
        let config = Config::load(None).unwrap();
        assert!(!config.get("WEB_PORT").unwrap().is_empty());
    }
}
