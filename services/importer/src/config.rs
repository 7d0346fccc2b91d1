//! Importer configuration.
//!
//! Built up in layers, each overriding the previous one: built-in defaults,
//! an optional YAML file, `PINCAST_*` environment variables, then the
//! command-line flags applied in `main`.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use netcdf_importer::{ImportOptions, Precision};
use serde::{Deserialize, Serialize};

/// Importer selected when none is configured
pub const DEFAULT_IMPORTER: &str = "pincast_netcdf";

/// Top-level importer configuration.
///
/// The YAML form is flat:
///
/// ```yaml
/// importer: pincast_netcdf
/// precip_field: RATE
/// quality_field: ${PINCAST_QUALITY:-QUALITY}
/// fillna: 0.0
/// dtype: single
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// Registered importer, full or short name
    pub importer: String,

    #[serde(flatten)]
    pub options: ImportOptions,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            importer: DEFAULT_IMPORTER.to_string(),
            options: ImportOptions::default(),
        }
    }
}

impl ImporterConfig {
    /// Defaults, overlaid with `path` if given, then with the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable substitution.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read importer config from {:?}", path.as_ref()))?;

        let expanded = expand_env_vars(&content)?;

        serde_yaml::from_str(&expanded)
            .with_context(|| format!("Failed to parse importer config from {:?}", path.as_ref()))
    }

    /// Override fields from `PINCAST_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|name| env::var(name).ok())
    }

    fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(importer) = lookup("PINCAST_IMPORTER") {
            self.importer = importer;
        }
        if let Some(field) = lookup("PINCAST_PRECIP_FIELD") {
            self.options.precip_field = field;
        }
        if let Some(field) = lookup("PINCAST_QUALITY_FIELD") {
            self.options.quality_field = if field.is_empty() { None } else { Some(field) };
        }
        if let Some(fill) = lookup("PINCAST_FILLNA") {
            let fill = fill
                .parse::<f64>()
                .with_context(|| format!("PINCAST_FILLNA is not a number: {}", fill))?;
            self.options.postprocess.fillna = Some(fill);
        }
        if let Some(dtype) = lookup("PINCAST_DTYPE") {
            self.options.postprocess.dtype = dtype.parse::<Precision>()?;
        }
        Ok(())
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_utils::temp_test_dir;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ImporterConfig::default();
        assert_eq!(config.importer, "pincast_netcdf");
        assert_eq!(config.options.precip_field, "RATE");
        assert_eq!(config.options.postprocess.dtype, Precision::Double);
    }

    #[test]
    fn test_from_yaml() {
        let dir = temp_test_dir();
        let path = dir.path().join("importer.yaml");
        fs::write(
            &path,
            "importer: importer_pincast_netcdf\nquality_field: QUALITY\nfillna: 0.0\ndtype: single\n",
        )
        .unwrap();

        let config = ImporterConfig::from_yaml(&path).unwrap();
        assert_eq!(config.importer, "importer_pincast_netcdf");
        assert_eq!(config.options.precip_field, "RATE");
        assert_eq!(config.options.quality_field.as_deref(), Some("QUALITY"));
        assert_eq!(config.options.postprocess.fillna, Some(0.0));
        assert_eq!(config.options.postprocess.dtype, Precision::Single);
    }

    #[test]
    fn test_from_yaml_missing_file() {
        let err = ImporterConfig::from_yaml("/nonexistent/importer.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read importer config"));
    }

    #[test]
    fn test_env_overrides_yaml_values() {
        let mut config: ImporterConfig =
            serde_yaml::from_str("precip_field: DBZH\ndtype: single\n").unwrap();
        let env = vars(&[
            ("PINCAST_PRECIP_FIELD", "RATE"),
            ("PINCAST_FILLNA", "-1"),
            ("PINCAST_DTYPE", "float64"),
        ]);

        config.apply_vars(|name| env.get(name).cloned()).unwrap();
        assert_eq!(config.options.precip_field, "RATE");
        assert_eq!(config.options.postprocess.fillna, Some(-1.0));
        assert_eq!(config.options.postprocess.dtype, Precision::Double);
    }

    #[test]
    fn test_env_empty_quality_clears_it() {
        let mut config = ImporterConfig::default();
        config.options.quality_field = Some("QUALITY".to_string());
        let env = vars(&[("PINCAST_QUALITY_FIELD", "")]);

        config.apply_vars(|name| env.get(name).cloned()).unwrap();
        assert_eq!(config.options.quality_field, None);
    }

    #[test]
    fn test_env_rejects_bad_values() {
        let env = vars(&[("PINCAST_FILLNA", "zero")]);
        let mut config = ImporterConfig::default();
        assert!(config.apply_vars(|name| env.get(name).cloned()).is_err());

        let env = vars(&[("PINCAST_DTYPE", "half")]);
        let mut config = ImporterConfig::default();
        assert!(config.apply_vars(|name| env.get(name).cloned()).is_err());
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("PINCAST_TEST_UNSET_VAR");
        let result = expand_env_vars("quality_field: ${PINCAST_TEST_UNSET_VAR:-QUALITY}").unwrap();
        assert_eq!(result, "quality_field: QUALITY");
    }

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("PINCAST_TEST_FIELD", "DBZH");
        let result = expand_env_vars("precip_field: ${PINCAST_TEST_FIELD}").unwrap();
        assert_eq!(result, "precip_field: DBZH");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        std::env::remove_var("PINCAST_TEST_REQUIRED");
        assert!(expand_env_vars("${PINCAST_TEST_REQUIRED}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }
}
