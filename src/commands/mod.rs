//! Command implementations for the nickelconf CLI.
//!
//! Each command returns a result struct implementing [`CommandResult`], so
//! `main` can print it as JSON (default) or as text (`-H`).

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::Result;
use crate::config::{Resolved, ValueSource};
use crate::engine::SetOutcome;
use crate::settings::{POWER_OPTIONS, PowerOptions, PowerSnapshot, Setting, SettingValue};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait CommandResult {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json_or_error<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Result of `get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetResult {
    pub key: &'static str,
    pub value: Option<SettingValue>,
}

impl CommandResult for GetResult {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        match &self.value {
            Some(value) => format!("{}={}", self.key, value),
            None => format!("{} is not set", self.key),
        }
    }
}

/// Read one setting.
pub fn get(config_path: &Path, setting: Setting) -> Result<GetResult> {
    let power = PowerOptions::new(config_path);
    let value = match setting {
        Setting::FrontLightLevel => Some(SettingValue::Integer(power.front_light_level()?)),
        other => power.get(other)?,
    };
    Ok(GetResult {
        key: setting.key(),
        value,
    })
}

/// Result of `set`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetResult {
    pub key: &'static str,
    pub value: SettingValue,
    pub outcome: SetOutcome,
}

impl CommandResult for SetResult {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        match self.outcome {
            SetOutcome::Replaced => format!("Updated {}={}", self.key, self.value),
            SetOutcome::Inserted => format!("Added {}={}", self.key, self.value),
            SetOutcome::CreatedSection => format!(
                "Added {}={} in a new [{}] section",
                self.key,
                self.value,
                POWER_OPTIONS
            ),
            SetOutcome::Skipped => format!("{} is not present; left unchanged", self.key),
        }
    }
}

/// Validate `raw` for `setting` and write it.
pub fn set(config_path: &Path, setting: Setting, raw: &str) -> Result<SetResult> {
    let value = setting.binding().parse(raw)?;
    let outcome = PowerOptions::new(config_path).set(setting, value)?;
    Ok(SetResult {
        key: setting.key(),
        value,
        outcome,
    })
}

/// Result of `show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub settings: PowerSnapshot,
}

impl CommandResult for ShowResult {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        fn opt<T: std::fmt::Display>(v: &Option<T>) -> String {
            v.as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "(not set)".to_string())
        }

        let s = &self.settings;
        [
            format!("[{}] in {}", POWER_OPTIONS, self.path.display()),
            format!("  FrontLightLevel:  {}", s.front_light_level),
            format!("  FrontLightState:  {}", opt(&s.front_light_state)),
            format!("  ColorSetting:     {}", opt(&s.color_setting)),
            format!("  AutoColorEnabled: {}", opt(&s.auto_color_enabled)),
        ]
        .join("\n")
    }
}

/// Read every power setting.
pub fn show(config_path: &Path) -> Result<ShowResult> {
    let settings = PowerOptions::new(config_path).snapshot()?;
    Ok(ShowResult {
        path: config_path.to_path_buf(),
        settings,
    })
}

/// Result of `where`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhereResult {
    pub path: PathBuf,
    pub source: ValueSource,
    pub exists: bool,
}

impl CommandResult for WhereResult {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        let state = if self.exists { "" } else { " (missing)" };
        format!("{}{} [from {}]", self.path.display(), state, self.source)
    }
}

/// Report the resolved config path.
pub fn locate(resolved: &Resolved<PathBuf>) -> WhereResult {
    WhereResult {
        path: resolved.value.clone(),
        source: resolved.source.clone(),
        exists: resolved.value.is_file(),
    }
}
