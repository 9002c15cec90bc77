//! Calibration configuration
//!
//! All knobs have defaults matching the standard s2f workflow; a YAML file
//! only needs to name the fields it overrides.
//!
//! ```yaml
//! stats_tool:
//!   program: /opt/connectome-tools/bin/connectome-stats
//! bouton_density:
//!   extra_args: ["-n", "500", "--assume-syns-bouton", "1.2"]
//! adjustments:
//!   mean_syns_connection:
//!     attribute_key: mean_syns_connection
//!     min_bound: 1.0
//!     max_bound: 50.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connectome_stats::StatsToolConfig;
use crate::recipe::AdjustmentSpec;
use crate::stats::KeyLayout;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// The two statistics validated against biological reference data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatisticKind {
    /// Bouton density per mtype
    BoutonDensity,
    /// Synapses per connection per pathway
    SynsPerConnection,
}

impl StatisticKind {
    pub fn layout(self) -> KeyLayout {
        match self {
            StatisticKind::BoutonDensity => KeyLayout::mtype(),
            StatisticKind::SynsPerConnection => KeyLayout::pathway(),
        }
    }

    /// `connectome-stats` subcommand
    pub fn subcommand(self) -> &'static str {
        match self {
            StatisticKind::BoutonDensity => "bouton-density",
            StatisticKind::SynsPerConnection => "nsyn-per-connection",
        }
    }

    /// Arguments selecting the sampled cells
    pub fn target_args(self, target: &str) -> Vec<String> {
        match self {
            StatisticKind::BoutonDensity => vec!["--sample-target".into(), target.into()],
            StatisticKind::SynsPerConnection => vec![
                "--pre".into(),
                target.into(),
                "--post".into(),
                target.into(),
            ],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatisticKind::BoutonDensity => "bouton density",
            StatisticKind::SynsPerConnection => "synapses per connection",
        }
    }
}

/// How to react when a collaborator is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Abort the run
    Required,
    /// Warn and continue with whatever is available
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationTaskConfig {
    /// Entry in the bioname `s2f.yaml` whose `bio_data` is the reference
    pub bioname_task: String,
    /// Extra `connectome-stats` arguments placed before the target selection
    pub extra_args: Vec<String>,
    pub reference_lookup: Policy,
    pub stats_tool: Policy,
}

impl ValidationTaskConfig {
    pub fn bouton_density() -> Self {
        Self {
            bioname_task: "estimate_individual_bouton_reduction".to_string(),
            extra_args: ["-n", "250", "--assume-syns-bouton", "1.2"]
                .into_iter()
                .map(String::from)
                .collect(),
            reference_lookup: Policy::BestEffort,
            stats_tool: Policy::BestEffort,
        }
    }

    pub fn syns_per_connection() -> Self {
        Self {
            bioname_task: "experimental_syns_con".to_string(),
            extra_args: Vec::new(),
            reference_lookup: Policy::Required,
            stats_tool: Policy::Required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustmentsConfig {
    pub bouton_reduction: AdjustmentSpec,
    pub mean_syns_connection: AdjustmentSpec,
}

impl Default for AdjustmentsConfig {
    fn default() -> Self {
        Self {
            bouton_reduction: AdjustmentSpec::bouton_reduction(),
            mean_syns_connection: AdjustmentSpec::mean_syns_connection(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConfigFile")]
pub struct CalibrationConfig {
    pub stats_tool: StatsToolConfig,
    pub bouton_density: ValidationTaskConfig,
    pub syns_per_connection: ValidationTaskConfig,
    pub adjustments: AdjustmentsConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            stats_tool: StatsToolConfig::default(),
            bouton_density: ValidationTaskConfig::bouton_density(),
            syns_per_connection: ValidationTaskConfig::syns_per_connection(),
            adjustments: AdjustmentsConfig::default(),
        }
    }
}

/// On-disk form: every field optional, merged onto the defaults of its kind.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    stats_tool: StatsToolConfig,
    bouton_density: TaskOverrides,
    syns_per_connection: TaskOverrides,
    adjustments: AdjustmentOverrides,
}

#[derive(Debug, Default, Deserialize)]
struct TaskOverrides {
    bioname_task: Option<String>,
    extra_args: Option<Vec<String>>,
    reference_lookup: Option<Policy>,
    stats_tool: Option<Policy>,
}

impl TaskOverrides {
    fn apply(self, base: ValidationTaskConfig) -> ValidationTaskConfig {
        ValidationTaskConfig {
            bioname_task: self.bioname_task.unwrap_or(base.bioname_task),
            extra_args: self.extra_args.unwrap_or(base.extra_args),
            reference_lookup: self.reference_lookup.unwrap_or(base.reference_lookup),
            stats_tool: self.stats_tool.unwrap_or(base.stats_tool),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AdjustmentOverrides {
    bouton_reduction: SpecOverrides,
    mean_syns_connection: SpecOverrides,
}

#[derive(Debug, Default, Deserialize)]
struct SpecOverrides {
    attribute_key: Option<String>,
    min_bound: Option<f64>,
    max_bound: Option<f64>,
}

impl SpecOverrides {
    fn apply(self, base: AdjustmentSpec) -> AdjustmentSpec {
        AdjustmentSpec {
            attribute_key: self.attribute_key.unwrap_or(base.attribute_key),
            min_bound: self.min_bound.unwrap_or(base.min_bound),
            max_bound: self.max_bound.unwrap_or(base.max_bound),
        }
    }
}

impl From<ConfigFile> for CalibrationConfig {
    fn from(file: ConfigFile) -> Self {
        Self {
            stats_tool: file.stats_tool,
            bouton_density: file
                .bouton_density
                .apply(ValidationTaskConfig::bouton_density()),
            syns_per_connection: file
                .syns_per_connection
                .apply(ValidationTaskConfig::syns_per_connection()),
            adjustments: AdjustmentsConfig {
                bouton_reduction: file
                    .adjustments
                    .bouton_reduction
                    .apply(AdjustmentSpec::bouton_reduction()),
                mean_syns_connection: file
                    .adjustments
                    .mean_syns_connection
                    .apply(AdjustmentSpec::mean_syns_connection()),
            },
        }
    }
}

impl CalibrationConfig {
    /// Load from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CalibrationConfig =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Defaults, or the file at `path` when given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn task(&self, kind: StatisticKind) -> &ValidationTaskConfig {
        match kind {
            StatisticKind::BoutonDensity => &self.bouton_density,
            StatisticKind::SynsPerConnection => &self.syns_per_connection,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stats_tool.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "stats_tool.program must not be empty".to_string(),
            ));
        }

        for spec in [
            &self.adjustments.bouton_reduction,
            &self.adjustments.mean_syns_connection,
        ] {
            if spec.attribute_key.is_empty() {
                return Err(ConfigError::Validation(
                    "adjustment attribute_key must not be empty".to_string(),
                ));
            }
            if !spec.min_bound.is_finite() || !spec.max_bound.is_finite() {
                return Err(ConfigError::Validation(format!(
                    "{} bounds must be finite, got [{}, {}]",
                    spec.attribute_key, spec.min_bound, spec.max_bound
                )));
            }
            if spec.min_bound > spec.max_bound {
                return Err(ConfigError::Validation(format!(
                    "{} min_bound {} exceeds max_bound {}",
                    spec.attribute_key, spec.min_bound, spec.max_bound
                )));
            }
        }

        for task in [&self.bouton_density, &self.syns_per_connection] {
            if task.bioname_task.is_empty() {
                return Err(ConfigError::Validation(
                    "bioname_task must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = CalibrationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stats_tool.program, "connectome-stats");
        assert_eq!(
            config.bouton_density.extra_args,
            vec!["-n", "250", "--assume-syns-bouton", "1.2"]
        );
        assert_eq!(config.bouton_density.reference_lookup, Policy::BestEffort);
        assert_eq!(config.syns_per_connection.reference_lookup, Policy::Required);
        assert_eq!(config.adjustments.mean_syns_connection.max_bound, 1e20);
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calibration.yaml");
        fs::write(
            &path,
            "stats_tool:\n  program: /opt/bin/connectome-stats\n\
             bouton_density:\n  bioname_task: estimate_individual_bouton_reduction\n  \
             extra_args: ['-n', '500']\n  reference_lookup: required\n  stats_tool: best_effort\n",
        )
        .unwrap();

        let config = CalibrationConfig::load(&path).unwrap();
        assert_eq!(config.stats_tool.program, "/opt/bin/connectome-stats");
        assert_eq!(config.bouton_density.extra_args, vec!["-n", "500"]);
        assert_eq!(config.bouton_density.reference_lookup, Policy::Required);
        assert_eq!(config.syns_per_connection, ValidationTaskConfig::syns_per_connection());
    }

    #[test]
    fn test_module_example_loads() {
        let yaml = "\
stats_tool:
  program: /opt/connectome-tools/bin/connectome-stats
bouton_density:
  extra_args: [\"-n\", \"500\", \"--assume-syns-bouton\", \"1.2\"]
adjustments:
  mean_syns_connection:
    attribute_key: mean_syns_connection
    min_bound: 1.0
    max_bound: 50.0
";
        let config: CalibrationConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.stats_tool.program, "/opt/connectome-tools/bin/connectome-stats");
        assert_eq!(
            config.bouton_density.extra_args,
            vec!["-n", "500", "--assume-syns-bouton", "1.2"]
        );
        assert_eq!(config.bouton_density.bioname_task, "estimate_individual_bouton_reduction");
        assert_eq!(config.bouton_density.reference_lookup, Policy::BestEffort);
        assert_eq!(config.syns_per_connection, ValidationTaskConfig::syns_per_connection());
        assert_eq!(config.adjustments.mean_syns_connection.max_bound, 50.0);
        assert_eq!(config.adjustments.bouton_reduction, AdjustmentSpec::bouton_reduction());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_single_field_override_keeps_kind_defaults() {
        let config: CalibrationConfig =
            serde_yaml::from_str("syns_per_connection:\n  stats_tool: best_effort\n").unwrap();

        assert_eq!(config.syns_per_connection.stats_tool, Policy::BestEffort);
        assert_eq!(config.syns_per_connection.reference_lookup, Policy::Required);
        assert_eq!(config.syns_per_connection.bioname_task, "experimental_syns_con");
        assert_eq!(config.bouton_density, ValidationTaskConfig::bouton_density());
    }

    #[test]
    fn test_dumped_config_loads_back() {
        let mut config = CalibrationConfig::default();
        config.syns_per_connection.extra_args = vec!["--seed".to_string(), "7".to_string()];

        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: CalibrationConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_empty_document_is_default() {
        let config: CalibrationConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, CalibrationConfig::default());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut config = CalibrationConfig::default();
        config.adjustments.bouton_reduction.min_bound = 2.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_unparsable_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calibration.yaml");
        fs::write(&path, "stats_tool: [unclosed").unwrap();
        assert!(matches!(
            CalibrationConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_target_args() {
        assert_eq!(
            StatisticKind::SynsPerConnection.target_args("mc2_Column"),
            vec!["--pre", "mc2_Column", "--post", "mc2_Column"]
        );
        assert_eq!(StatisticKind::BoutonDensity.layout(), KeyLayout::mtype());
    }
}
