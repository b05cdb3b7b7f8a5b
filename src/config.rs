use crate::analyzer::{GroupCriterion, SortCriterion};
use crate::i18n::Lang;
use crate::model::{ObjectiveParam, Parameter, SubjectiveParam};
use crate::normalizer::ParameterRanges;
use crate::palette::default_palette;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Which chart axes (and score terms) are switched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledParams(BTreeMap<Parameter, bool>);

impl Default for EnabledParams {
    /// Every objective parameter except Parking, plus Vibe.
    fn default() -> Self {
        Self(
            Parameter::all()
                .into_iter()
                .map(|p| {
                    let on = match p {
                        Parameter::Objective(ObjectiveParam::Parking) => false,
                        Parameter::Objective(_) => true,
                        Parameter::Subjective(s) => s == SubjectiveParam::Vibe,
                    };
                    (p, on)
                })
                .collect(),
        )
    }
}

impl EnabledParams {
    pub fn is_enabled(&self, param: Parameter) -> bool {
        self.0.get(&param).copied().unwrap_or(false)
    }

    pub fn set(&mut self, param: Parameter, on: bool) {
        self.0.insert(param, on);
    }

    pub fn toggle(&mut self, param: Parameter) {
        let on = self.is_enabled(param);
        self.set(param, !on);
    }

    /// Enabled parameters in chart order.
    pub fn enabled(&self) -> Vec<Parameter> {
        Parameter::all()
            .into_iter()
            .filter(|p| self.is_enabled(*p))
            .collect()
    }
}

impl Serialize for EnabledParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (param, on) in &self.0 {
            map.serialize_entry(param.name(), on)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EnabledParams {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored: BTreeMap<String, bool> = BTreeMap::deserialize(deserializer)?;
        let mut enabled = EnabledParams::default();
        for (name, on) in stored {
            match Parameter::from_name(&name) {
                Some(param) => enabled.set(param, on),
                None => warn!("Ignoring unknown parameter '{}' in config", name),
            }
        }
        Ok(enabled)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Base URL of the realtime database, e.g. `https://<project>.firebasedatabase.app`.
    pub database_url: Option<String>,
    /// Room to join on startup.
    pub room: Option<String>,
    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
    pub echo_cooldown_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            room: None,
            poll_interval_ms: 1000,
            debounce_ms: 800,
            echo_cooldown_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub language: Lang,
    pub database_path: String,
    pub enabled_params: EnabledParams,
    pub parameter_ranges: ParameterRanges,
    pub palette: Vec<String>,
    pub sort: SortCriterion,
    pub group: GroupCriterion,
    pub show_sold_in_graph: bool,
    pub sync: SyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: Lang::default(),
            database_path: "flat-compare.db".to_string(),
            enabled_params: EnabledParams::default(),
            parameter_ranges: ParameterRanges::default(),
            palette: default_palette(),
            sort: SortCriterion::default(),
            group: GroupCriterion::default(),
            show_sold_in_graph: false,
            sync: SyncConfig::default(),
        }
    }
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Loads `path` if it exists; a missing file means compiled-in defaults.
pub fn load_config_or_default(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        info!("No config at {}, using defaults", path);
        return Ok(AppConfig::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enabled_params() {
        let enabled = EnabledParams::default();
        assert!(enabled.is_enabled(Parameter::Objective(ObjectiveParam::LowPrice)));
        assert!(!enabled.is_enabled(Parameter::Objective(ObjectiveParam::Parking)));
        assert!(enabled.is_enabled(Parameter::Subjective(SubjectiveParam::Vibe)));
        assert!(!enabled.is_enabled(Parameter::Subjective(SubjectiveParam::Noise)));
        assert_eq!(enabled.enabled().len(), 7);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let json = r#"{"language": "en", "enabledParams": {"Parking": true, "Size": false}}"#;
        let cfg: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.language, Lang::En);
        assert!(cfg.enabled_params.is_enabled(Parameter::Objective(ObjectiveParam::Parking)));
        assert!(!cfg.enabled_params.is_enabled(Parameter::Objective(ObjectiveParam::InteriorArea)));
        assert_eq!(cfg.sync.debounce_ms, 800);
        assert_eq!(cfg.palette.len(), 10);
        assert_eq!(cfg.sort, SortCriterion::GraphScore);
    }

    #[test]
    fn toggle_flips_state() {
        let mut enabled = EnabledParams::default();
        let p = Parameter::Subjective(SubjectiveParam::Noise);
        enabled.toggle(p);
        assert!(enabled.is_enabled(p));
        enabled.toggle(p);
        assert!(!enabled.is_enabled(p));
    }
}
