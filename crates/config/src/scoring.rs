//! Lead Scoring Configuration
//!
//! Weights, keyword lists, and temperature thresholds for the additive lead
//! score. Defaults reproduce the production heuristic; a YAML file can
//! override any subset.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Scoring configuration, optionally loaded from scoring.yaml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Temperature thresholds (score cut-offs)
    #[serde(default)]
    pub thresholds: TemperatureThresholds,
    /// Signals scored on the parent path
    #[serde(default)]
    pub parent: ParentScoring,
    /// Signals scored on the institution path
    #[serde(default)]
    pub institution: InstitutionScoring,
}

impl ScoringConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScoringConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ScoringConfigError::FileNotFound(path.as_ref().display().to_string(), e.to_string())
        })?;

        serde_yaml::from_str(&content).map_err(|e| ScoringConfigError::ParseError(e.to_string()))
    }

    /// Sum of every parent signal weight
    pub fn parent_max(&self) -> u32 {
        self.parent.grade_weight + self.parent.interest_weight + self.parent.phone_weight
    }

    /// Sum of every institution signal weight
    pub fn institution_max(&self) -> u32 {
        self.institution.role_weight
            + self.institution.strength_weight
            + self.institution.program_format_weight
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thresholds.warm >= self.thresholds.hot {
            return Err(ConfigError::InvalidValue {
                field: "scoring.thresholds".to_string(),
                message: format!(
                    "warm ({}) must be below hot ({})",
                    self.thresholds.warm, self.thresholds.hot
                ),
            });
        }

        let band = &self.parent.grade_band;
        if band.min > band.max {
            return Err(ConfigError::InvalidValue {
                field: "scoring.parent.grade_band".to_string(),
                message: format!("min ({}) exceeds max ({})", band.min, band.max),
            });
        }

        let keyword_lists = [
            ("scoring.parent.interest_keywords", &self.parent.interest_keywords),
            ("scoring.institution.role_keywords", &self.institution.role_keywords),
            (
                "scoring.institution.program_format_keywords",
                &self.institution.program_format_keywords,
            ),
        ];
        for (field, keywords) in keyword_lists {
            if keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Keywords must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Score cut-offs; HOT is `score >= hot`, WARM is `score >= warm`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureThresholds {
    #[serde(default = "default_hot")]
    pub hot: u32,
    #[serde(default = "default_warm")]
    pub warm: u32,
}

impl Default for TemperatureThresholds {
    fn default() -> Self {
        Self {
            hot: default_hot(),
            warm: default_warm(),
        }
    }
}

fn default_hot() -> u32 {
    60
}
fn default_warm() -> u32 {
    30
}

/// Inclusive grade range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeBand {
    pub min: u32,
    pub max: u32,
}

impl GradeBand {
    pub fn contains(&self, grade: u32) -> bool {
        (self.min..=self.max).contains(&grade)
    }
}

impl Default for GradeBand {
    fn default() -> Self {
        Self { min: 3, max: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentScoring {
    /// Core grade band for the flagship programs
    #[serde(default)]
    pub grade_band: GradeBand,
    #[serde(default = "default_grade_weight")]
    pub grade_weight: u32,
    #[serde(default = "default_interest_keywords")]
    pub interest_keywords: Vec<String>,
    #[serde(default = "default_interest_weight")]
    pub interest_weight: u32,
    #[serde(default = "default_phone_weight")]
    pub phone_weight: u32,
}

impl Default for ParentScoring {
    fn default() -> Self {
        Self {
            grade_band: GradeBand::default(),
            grade_weight: default_grade_weight(),
            interest_keywords: default_interest_keywords(),
            interest_weight: default_interest_weight(),
            phone_weight: default_phone_weight(),
        }
    }
}

fn default_grade_weight() -> u32 {
    20
}
fn default_interest_keywords() -> Vec<String> {
    vec!["coding".into(), "robotics".into(), "stem".into()]
}
fn default_interest_weight() -> u32 {
    15
}
fn default_phone_weight() -> u32 {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionScoring {
    /// Decision-maker roles
    #[serde(default = "default_role_keywords")]
    pub role_keywords: Vec<String>,
    #[serde(default = "default_role_weight")]
    pub role_weight: u32,
    /// Strength strictly above this scores
    #[serde(default = "default_strength_threshold")]
    pub strength_threshold: u32,
    #[serde(default = "default_strength_weight")]
    pub strength_weight: u32,
    #[serde(default = "default_program_format_keywords")]
    pub program_format_keywords: Vec<String>,
    #[serde(default = "default_program_format_weight")]
    pub program_format_weight: u32,
}

impl Default for InstitutionScoring {
    fn default() -> Self {
        Self {
            role_keywords: default_role_keywords(),
            role_weight: default_role_weight(),
            strength_threshold: default_strength_threshold(),
            strength_weight: default_strength_weight(),
            program_format_keywords: default_program_format_keywords(),
            program_format_weight: default_program_format_weight(),
        }
    }
}

fn default_role_keywords() -> Vec<String> {
    vec!["principal".into(), "coordinator".into(), "management".into()]
}
fn default_role_weight() -> u32 {
    30
}
fn default_strength_threshold() -> u32 {
    1000
}
fn default_strength_weight() -> u32 {
    25
}
fn default_program_format_keywords() -> Vec<String> {
    vec!["integrated".into()]
}
fn default_program_format_weight() -> u32 {
    20
}

/// Errors when loading scoring configuration
#[derive(Debug)]
pub enum ScoringConfigError {
    FileNotFound(String, String),
    ParseError(String),
}

impl std::fmt::Display for ScoringConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileNotFound(path, err) => {
                write!(f, "Scoring config not found at {}: {}", path, err)
            }
            Self::ParseError(err) => write!(f, "Failed to parse scoring config: {}", err),
        }
    }
}

impl std::error::Error for ScoringConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_weights() {
        let config = ScoringConfig::default();
        assert_eq!(config.parent_max(), 55);
        assert_eq!(config.institution_max(), 75);
        assert!(config.parent.grade_band.contains(3));
        assert!(config.parent.grade_band.contains(8));
        assert!(!config.parent.grade_band.contains(9));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
thresholds:
  hot: 70
institution:
  strength_threshold: 500
"#;
        let config: ScoringConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.thresholds.hot, 70);
        assert_eq!(config.thresholds.warm, 30);
        assert_eq!(config.institution.strength_threshold, 500);
        assert_eq!(config.institution.role_weight, 30);
        assert_eq!(config.parent.interest_keywords.len(), 3);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = ScoringConfig::default();
        config.thresholds.warm = 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_grade_band_rejected() {
        let mut config = ScoringConfig::default();
        config.parent.grade_band = GradeBand { min: 9, max: 3 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "parent:\n  phone_weight: 10").unwrap();
        let config = ScoringConfig::load(file.path()).unwrap();
        assert_eq!(config.parent.phone_weight, 10);
        assert_eq!(config.parent_max(), 45);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ScoringConfig::load("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ScoringConfigError::FileNotFound(_, _)));
    }
}
