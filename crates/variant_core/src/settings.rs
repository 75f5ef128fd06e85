use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreErrorCode};
use crate::naming::NamingConfig;
use crate::registry::Modifier;

pub const SETTINGS_VERSION: u32 = 2;
pub const DEFAULT_PROFILE_NAME: &str = "Default";

/// Stock install location of the scenario folder on Windows.
pub const DEFAULT_SCENARIO_DIR: &str = r"C:\Program Files (x86)\Steam\steamapps\common\FPSAimTrainer\FPSAimTrainer\Saved\SaveGames\Scenarios";

/// One candidate value for a modifier, with its batch-selection state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueChoice {
    pub value: f64,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierPrefs {
    pub tag_text: String,
    pub values: Vec<ValueChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub folder_path: String,
    /// Keyed by `Modifier::key()`.
    pub modifiers: BTreeMap<String, ModifierPrefs>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub version: u32,
    pub language: String,
    pub last_active_profile: String,
    pub profiles: BTreeMap<String, Profile>,
}

fn default_values(modifier: Modifier) -> &'static [f64] {
    match modifier {
        Modifier::Size | Modifier::Speed => {
            &[50.0, 60.0, 70.0, 80.0, 90.0, 110.0, 120.0, 130.0, 140.0, 150.0, 200.0]
        }
        Modifier::Timescale => {
            &[40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 110.0, 120.0, 130.0, 150.0, 200.0]
        }
        Modifier::Duration => &[15.0, 30.0, 45.0, 60.0, 90.0, 120.0],
        Modifier::Hp => &[20.0, 50.0, 80.0, 90.0, 110.0, 130.0, 150.0, 200.0, 300.0],
        Modifier::RegenRate => {
            &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
        }
    }
}

fn default_enabled(modifier: Modifier) -> &'static [f64] {
    match modifier {
        Modifier::Size => &[50.0, 70.0, 90.0, 110.0, 130.0, 150.0, 200.0],
        Modifier::Speed => &[50.0, 70.0, 90.0, 110.0],
        Modifier::Timescale => &[40.0, 60.0, 80.0, 90.0],
        Modifier::Duration => &[15.0, 30.0, 90.0],
        Modifier::Hp | Modifier::RegenRate => &[],
    }
}

impl Profile {
    pub fn default_profile() -> Self {
        let mut modifiers = BTreeMap::new();
        for modifier in Modifier::ALL {
            let enabled = default_enabled(modifier);
            let values = default_values(modifier)
                .iter()
                .map(|&value| ValueChoice {
                    value,
                    enabled: enabled.contains(&value),
                })
                .collect();
            modifiers.insert(
                modifier.key().to_string(),
                ModifierPrefs {
                    tag_text: modifier.spec().default_tag.to_string(),
                    values,
                },
            );
        }
        Self {
            folder_path: DEFAULT_SCENARIO_DIR.to_string(),
            modifiers,
        }
    }

    pub fn prefs(&self, modifier: Modifier) -> Option<&ModifierPrefs> {
        self.modifiers.get(modifier.key())
    }

    pub fn enabled_values(&self, modifier: Modifier) -> Vec<f64> {
        self.prefs(modifier)
            .map(|prefs| {
                prefs
                    .values
                    .iter()
                    .filter(|choice| choice.enabled)
                    .map(|choice| choice.value)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tag configuration for this profile; rejects duplicate or empty
    /// tag texts at load time rather than at generation time.
    pub fn naming_config(&self) -> Result<NamingConfig, CoreError> {
        let mut tags = BTreeMap::new();
        for modifier in Modifier::ALL {
            if let Some(prefs) = self.prefs(modifier) {
                tags.insert(modifier, prefs.tag_text.clone());
            }
        }
        NamingConfig::new(tags)
    }

    /// Fills in anything a hand-edited file dropped, from the defaults.
    fn repair(&mut self) {
        let default = Profile::default_profile();
        for (key, prefs) in default.modifiers {
            self.modifiers.entry(key).or_insert(prefs);
        }
        if self.folder_path.is_empty() {
            self.folder_path = default.folder_path;
        }
    }
}

impl Settings {
    pub fn default_settings() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(DEFAULT_PROFILE_NAME.to_string(), Profile::default_profile());
        Self {
            version: SETTINGS_VERSION,
            language: "EN".to_string(),
            last_active_profile: DEFAULT_PROFILE_NAME.to_string(),
            profiles,
        }
    }

    /// Loads settings, falling back to defaults when the file is
    /// missing or unreadable. Parse errors degrade to defaults too
    /// (with a warning) so a corrupt settings file never blocks the
    /// tool, matching the fresh-start behavior of earlier versions.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default_settings(),
        };
        match Self::from_json(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("ignoring unusable settings file {}: {e}", path.display());
                Self::default_settings()
            }
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| CoreError::new(CoreErrorCode::Settings, format!("invalid JSON: {e}")))?;

        let version = value.get("version").and_then(Value::as_u64).unwrap_or(1);
        let mut settings = if version == u64::from(SETTINGS_VERSION) {
            serde_json::from_value::<Settings>(value).map_err(|e| {
                CoreError::new(CoreErrorCode::Settings, format!("invalid settings: {e}"))
            })?
        } else if version == 1 {
            migrate_v1(&value)
        } else {
            return Err(CoreError::new(
                CoreErrorCode::Settings,
                format!("unsupported settings version {version}"),
            ));
        };

        if settings.profiles.is_empty() {
            settings
                .profiles
                .insert(DEFAULT_PROFILE_NAME.to_string(), Profile::default_profile());
        }
        for profile in settings.profiles.values_mut() {
            profile.repair();
        }
        if !settings.profiles.contains_key(&settings.last_active_profile) {
            settings.last_active_profile = settings
                .profiles
                .keys()
                .next()
                .cloned()
                .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string());
        }
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let raw = serde_json::to_string_pretty(self).map_err(|e| {
            CoreError::new(CoreErrorCode::Settings, format!("cannot serialize: {e}"))
        })?;
        fs::write(path, raw).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("cannot write {}: {e}", path.display()),
            )
        })
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.profiles
            .get(&self.last_active_profile)
            .or_else(|| self.profiles.values().next())
    }
}

/// Migrates the legacy flat layout: per-modifier `*_percentages` arrays
/// (or one shared `percentages` array before that), a `checkboxes` map
/// keyed `"SIZE_0"`, and a `variant_tags` map keyed by uppercase
/// modifier name.
fn migrate_v1(value: &Value) -> Settings {
    let mut settings = Settings::default_settings();

    if let Some(language) = value.get("language").and_then(Value::as_str) {
        settings.language = language.to_string();
    }
    if let Some(last) = value.get("last_active_profile").and_then(Value::as_str) {
        settings.last_active_profile = last.to_string();
    }

    let Some(profiles) = value.get("profiles").and_then(Value::as_object) else {
        return settings;
    };

    settings.profiles.clear();
    for (name, legacy) in profiles {
        settings
            .profiles
            .insert(name.clone(), migrate_v1_profile(legacy));
    }
    if settings.profiles.is_empty() {
        settings
            .profiles
            .insert(DEFAULT_PROFILE_NAME.to_string(), Profile::default_profile());
    }
    settings
}

fn migrate_v1_profile(legacy: &Value) -> Profile {
    let mut profile = Profile::default_profile();

    if let Some(folder) = legacy.get("folder_path").and_then(Value::as_str) {
        profile.folder_path = folder.to_string();
    }

    let checkboxes = legacy.get("checkboxes").and_then(Value::as_object);
    let variant_tags = legacy.get("variant_tags").and_then(Value::as_object);
    let shared_percentages = legacy_number_array(legacy.get("percentages"));

    for modifier in Modifier::ALL {
        let values = legacy_number_array(legacy.get(modifier.legacy_value_key()))
            .or_else(|| {
                // The oldest layout shared one percentage list across
                // size, speed and timescale.
                match modifier {
                    Modifier::Size | Modifier::Speed | Modifier::Timescale => {
                        shared_percentages.clone()
                    }
                    _ => None,
                }
            })
            .unwrap_or_else(|| default_values(modifier).to_vec());

        let choices = values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let enabled = checkboxes
                    .and_then(|m| m.get(&format!("{}_{i}", modifier.legacy_key())))
                    .and_then(Value::as_bool)
                    .unwrap_or_else(|| default_enabled(modifier).contains(&value));
                ValueChoice { value, enabled }
            })
            .collect();

        let tag_text = variant_tags
            .and_then(|m| m.get(modifier.legacy_key()))
            .and_then(Value::as_str)
            .unwrap_or(modifier.spec().default_tag)
            .to_string();

        profile.modifiers.insert(
            modifier.key().to_string(),
            ModifierPrefs {
                tag_text,
                values: choices,
            },
        );
    }

    profile
}

fn legacy_number_array(value: Option<&Value>) -> Option<Vec<f64>> {
    let array = value?.as_array()?;
    let mut out = Vec::with_capacity(array.len());
    for item in array {
        out.push(item.as_f64()?);
    }
    Some(out)
}
