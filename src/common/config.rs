use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::sys::geometry::Rect;

pub fn config_file() -> PathBuf { dirs::home_dir().unwrap().join(".sill.toml") }

/// What to do with a panic escaping an application listener during event
/// delivery.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallbackPolicy {
    /// Report through the diagnostic channel and keep delivering.
    #[default]
    Forward,
    /// Resume the unwind. The event logic still confines it to the failing
    /// host's drain unit.
    Rethrow,
}

/// Whether default creation bounds describe the client area or the window
/// frame.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DefaultBoundsMode {
    #[default]
    Client,
    Window,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Seconds an iconify/maximize/focus report must persist before it is
    /// treated as confirmed.
    #[serde(default = "default_state_stability")]
    pub state_stability: f64,
    /// Seconds a hide report must persist; a show arriving within the window
    /// cancels it as a flicker.
    #[serde(default = "default_hidden_stability")]
    pub hidden_stability: f64,
    /// Seconds a show report must persist before SHOWN becomes eligible.
    #[serde(default = "default_anti_flicker")]
    pub anti_flicker: f64,
    /// Seconds between window-event-logic passes.
    #[serde(default = "default_event_logic_period")]
    pub event_logic_period: f64,
    /// Bounds applied to every host at creation.
    #[serde(default = "default_bounds")]
    pub default_bounds: Rect,
    #[serde(default)]
    pub default_bounds_mode: DefaultBoundsMode,
    #[serde(default)]
    pub callback_policy: CallbackPolicy,
}

fn default_state_stability() -> f64 { 0.10 }
fn default_hidden_stability() -> f64 { 0.25 }
fn default_anti_flicker() -> f64 { 0.05 }
fn default_event_logic_period() -> f64 { 0.05 }
fn default_bounds() -> Rect { Rect::new(100, 200, 300, 400) }

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_stability: default_state_stability(),
            hidden_stability: default_hidden_stability(),
            anti_flicker: default_anti_flicker(),
            event_logic_period: default_event_logic_period(),
            default_bounds: default_bounds(),
            default_bounds_mode: DefaultBoundsMode::default(),
            callback_policy: CallbackPolicy::default(),
        }
    }
}

impl Settings {
    /// All delays zero: every backing report commits synchronously and the
    /// event stream is fully deterministic. Intended for tests.
    pub fn immediate() -> Self {
        Self {
            state_stability: 0.0,
            hidden_stability: 0.0,
            anti_flicker: 0.0,
            ..Self::default()
        }
    }

    pub fn state_stability_delay(&self) -> Duration { secs(self.state_stability) }

    pub fn hidden_stability_delay(&self) -> Duration { secs(self.hidden_stability) }

    pub fn anti_flicker_delay(&self) -> Duration { secs(self.anti_flicker) }

    pub fn event_logic_period_duration(&self) -> Duration { secs(self.event_logic_period) }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (name, value) in [
            ("state_stability", self.state_stability),
            ("hidden_stability", self.hidden_stability),
            ("anti_flicker", self.anti_flicker),
        ] {
            if !value.is_finite() || value < 0.0 {
                issues.push(format!("{} must be a non-negative number of seconds", name));
            }
        }

        if !self.event_logic_period.is_finite() || self.event_logic_period <= 0.0 {
            issues.push("event_logic_period must be a positive number of seconds".to_string());
        }

        if self.default_bounds.is_empty() {
            issues.push("default_bounds must have positive width and height".to_string());
        }

        issues
    }

    pub fn auto_fix(&mut self) -> usize {
        let mut fixes = 0;

        for value in [
            &mut self.state_stability,
            &mut self.hidden_stability,
            &mut self.anti_flicker,
        ] {
            if !value.is_finite() || *value < 0.0 {
                *value = 0.0;
                fixes += 1;
            }
        }

        if !self.event_logic_period.is_finite() || self.event_logic_period <= 0.0 {
            self.event_logic_period = default_event_logic_period();
            fixes += 1;
        }

        if self.default_bounds.is_empty() {
            self.default_bounds = default_bounds();
            fixes += 1;
        }

        fixes
    }
}

fn secs(value: f64) -> Duration { Duration::from_secs_f64(value.max(0.0)) }

#[derive(Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    settings: Option<Settings>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub settings: Settings,
}

impl Default for Config {
    fn default() -> Self { Config { settings: Settings::default() } }
}

impl Config {
    pub fn parse(contents: &str) -> anyhow::Result<Config> {
        let file: ConfigFile = toml::from_str(contents)?;
        let settings = file.settings.unwrap_or_default();
        let issues = settings.validate();
        if !issues.is_empty() {
            bail!("invalid config: {}", issues.join("; "));
        }
        Ok(Config { settings })
    }

    pub fn load(path: &Path) -> anyhow::Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Config::parse(&contents)
    }
}
