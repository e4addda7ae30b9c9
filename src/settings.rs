//! Key bindings and typed accessors for the `[PowerOptions]` section.
//!
//! Each [`KeyBinding`] is static data: the key name, the regex fragment its
//! value must match, the owning section, the legal values, and whether a
//! write may fabricate the entry when it is missing. [`PowerOptions`] pairs
//! those bindings with a [`SectionEngine`] and exposes typed getters/setters.
//!
//! Setters validate before touching the file. Out-of-range numbers and
//! non-boolean words are rejected, never clamped.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::engine::{KeyPattern, SectionEngine, SectionMatcher, SetOutcome};
use crate::{Error, Result};

/// Section holding every setting managed here.
pub const POWER_OPTIONS: &str = "PowerOptions";

/// Value written and returned when `FrontLightLevel` is missing.
pub const DEFAULT_FRONT_LIGHT_LEVEL: i64 = 1;

/// Legal values for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Integer within `min..=max`
    Integer { min: i64, max: i64 },
    /// `true` or `false`
    Boolean,
}

/// A typed setting value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Integer(i64),
    Boolean(bool),
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValue::Integer(n) => write!(f, "{}", n),
            SettingValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Static description of one key in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: &'static str,
    /// Regex fragment for the value, captured as group 1
    pub value_grammar: &'static str,
    pub section: &'static str,
    pub kind: ValueKind,
    /// Whether `set` may add the key (and section) when absent
    pub create_if_missing: bool,
}

pub const FRONT_LIGHT_LEVEL: KeyBinding = KeyBinding {
    key: "FrontLightLevel",
    value_grammar: "[0-9]+",
    section: POWER_OPTIONS,
    kind: ValueKind::Integer { min: 0, max: 100 },
    create_if_missing: true,
};

/// Nickel omits this key until the light is first toggled; never fabricate it.
pub const FRONT_LIGHT_STATE: KeyBinding = KeyBinding {
    key: "FrontLightState",
    value_grammar: r"(?-u:.)*?",
    section: POWER_OPTIONS,
    kind: ValueKind::Boolean,
    create_if_missing: false,
};

pub const COLOR_SETTING: KeyBinding = KeyBinding {
    key: "ColorSetting",
    value_grammar: "[0-9]+",
    section: POWER_OPTIONS,
    kind: ValueKind::Integer {
        min: 1500,
        max: 6400,
    },
    create_if_missing: true,
};

pub const AUTO_COLOR_ENABLED: KeyBinding = KeyBinding {
    key: "AutoColorEnabled",
    value_grammar: r"[a-z]+",
    section: POWER_OPTIONS,
    kind: ValueKind::Boolean,
    create_if_missing: true,
};

impl KeyBinding {
    pub fn section_matcher(&self) -> Result<SectionMatcher> {
        SectionMatcher::new(self.section)
    }

    pub fn key_pattern(&self) -> Result<KeyPattern> {
        KeyPattern::new(self.key, self.value_grammar)
    }

    /// Check that `value` is legal for this key.
    pub fn validate(&self, value: &SettingValue) -> Result<()> {
        match (self.kind, value) {
            (ValueKind::Integer { min, max }, SettingValue::Integer(n)) => {
                if (min..=max).contains(n) {
                    Ok(())
                } else {
                    Err(Error::OutOfRange {
                        key: self.key.to_string(),
                        value: *n,
                        min,
                        max,
                    })
                }
            }
            (ValueKind::Boolean, SettingValue::Boolean(_)) => Ok(()),
            (ValueKind::Integer { .. }, SettingValue::Boolean(b)) => Err(Error::InvalidInput(
                format!("{} expects an integer, got boolean {}", self.key, b),
            )),
            (ValueKind::Boolean, SettingValue::Integer(n)) => Err(Error::InvalidInput(format!(
                "{} expects true or false, got {}",
                self.key, n
            ))),
        }
    }

    /// Parse and validate user input for this key.
    pub fn parse(&self, raw: &str) -> Result<SettingValue> {
        let raw = raw.trim();
        let value = match self.kind {
            ValueKind::Integer { .. } => raw.parse::<i64>().map(SettingValue::Integer).map_err(
                |_| Error::InvalidInput(format!("{} expects an integer, got '{}'", self.key, raw)),
            )?,
            ValueKind::Boolean => match raw.to_lowercase().as_str() {
                "true" => SettingValue::Boolean(true),
                "false" => SettingValue::Boolean(false),
                _ => {
                    return Err(Error::InvalidInput(format!(
                        "{} expects true or false, got '{}'",
                        self.key, raw
                    )));
                }
            },
        };
        self.validate(&value)?;
        Ok(value)
    }

    /// Interpret a value captured from the file.
    ///
    /// Booleans are `true` only for the exact word `true`. Integers that do
    /// not fit are treated as absent.
    pub fn coerce(&self, raw: &str) -> Option<SettingValue> {
        match self.kind {
            ValueKind::Integer { .. } => raw.parse().ok().map(SettingValue::Integer),
            ValueKind::Boolean => Some(SettingValue::Boolean(raw == "true")),
        }
    }
}

/// Settings selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Setting {
    FrontLightLevel,
    FrontLightState,
    ColorSetting,
    AutoColorEnabled,
}

impl Setting {
    pub const ALL: [Setting; 4] = [
        Setting::FrontLightLevel,
        Setting::FrontLightState,
        Setting::ColorSetting,
        Setting::AutoColorEnabled,
    ];

    pub fn binding(&self) -> &'static KeyBinding {
        match self {
            Setting::FrontLightLevel => &FRONT_LIGHT_LEVEL,
            Setting::FrontLightState => &FRONT_LIGHT_STATE,
            Setting::ColorSetting => &COLOR_SETTING,
            Setting::AutoColorEnabled => &AUTO_COLOR_ENABLED,
        }
    }

    /// Key name as it appears in the file.
    pub fn key(&self) -> &'static str {
        self.binding().key
    }
}

/// One value per setting; `None` when absent from the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerSnapshot {
    pub front_light_level: i64,
    pub front_light_state: Option<bool>,
    pub color_setting: Option<i64>,
    pub auto_color_enabled: Option<bool>,
}

/// Typed access to the `[PowerOptions]` keys of one config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerOptions {
    engine: SectionEngine,
}

impl PowerOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_engine(SectionEngine::new(path))
    }

    pub fn with_engine(engine: SectionEngine) -> Self {
        Self { engine }
    }

    /// Raw lookup through the engine, coerced to the binding's type.
    pub fn get(&self, setting: Setting) -> Result<Option<SettingValue>> {
        let binding = setting.binding();
        let raw = self
            .engine
            .get(&binding.section_matcher()?, &binding.key_pattern()?)?;
        Ok(raw.and_then(|raw| binding.coerce(&raw)))
    }

    /// Validate `value` and write it.
    pub fn set(&self, setting: Setting, value: SettingValue) -> Result<SetOutcome> {
        let binding = setting.binding();
        binding.validate(&value)?;
        self.engine.set(
            &binding.section_matcher()?,
            binding.key,
            &binding.key_pattern()?,
            &value.to_string(),
            binding.create_if_missing,
        )
    }

    /// Front light brightness, 0-100.
    ///
    /// If the key is missing (or unreadable) the default level is written
    /// back to the file and returned. A value present in the file is returned
    /// as-is without a range check, so a hand-edited `FrontLightLevel=150`
    /// reads back as 150.
    pub fn front_light_level(&self) -> Result<i64> {
        if let Some(SettingValue::Integer(level)) = self.get(Setting::FrontLightLevel)? {
            return Ok(level);
        }
        tracing::info!(
            path = %self.engine.path().display(),
            level = DEFAULT_FRONT_LIGHT_LEVEL,
            "FrontLightLevel missing, writing default"
        );
        self.set_front_light_level(DEFAULT_FRONT_LIGHT_LEVEL)?;
        Ok(DEFAULT_FRONT_LIGHT_LEVEL)
    }

    pub fn set_front_light_level(&self, level: i64) -> Result<SetOutcome> {
        self.set(Setting::FrontLightLevel, SettingValue::Integer(level))
    }

    pub fn front_light_state(&self) -> Result<Option<bool>> {
        self.get_bool(Setting::FrontLightState)
    }

    /// Only rewrites an existing entry; a missing key is left missing.
    pub fn set_front_light_state(&self, on: bool) -> Result<SetOutcome> {
        self.set(Setting::FrontLightState, SettingValue::Boolean(on))
    }

    /// Colour temperature in kelvin.
    pub fn color_setting(&self) -> Result<Option<i64>> {
        self.get_int(Setting::ColorSetting)
    }

    pub fn set_color_setting(&self, kelvin: i64) -> Result<SetOutcome> {
        self.set(Setting::ColorSetting, SettingValue::Integer(kelvin))
    }

    pub fn auto_color_enabled(&self) -> Result<Option<bool>> {
        self.get_bool(Setting::AutoColorEnabled)
    }

    pub fn set_auto_color_enabled(&self, enabled: bool) -> Result<SetOutcome> {
        self.set(Setting::AutoColorEnabled, SettingValue::Boolean(enabled))
    }

    /// Read all four settings. Reading the level may write its default.
    pub fn snapshot(&self) -> Result<PowerSnapshot> {
        Ok(PowerSnapshot {
            front_light_level: self.front_light_level()?,
            front_light_state: self.front_light_state()?,
            color_setting: self.color_setting()?,
            auto_color_enabled: self.auto_color_enabled()?,
        })
    }

    fn get_int(&self, setting: Setting) -> Result<Option<i64>> {
        Ok(match self.get(setting)? {
            Some(SettingValue::Integer(n)) => Some(n),
            _ => None,
        })
    }

    fn get_bool(&self, setting: Setting) -> Result<Option<bool>> {
        Ok(match self.get(setting)? {
            Some(SettingValue::Boolean(b)) => Some(b),
            _ => None,
        })
    }
}
