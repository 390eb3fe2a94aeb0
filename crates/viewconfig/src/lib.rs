use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteSetting {
    #[default]
    Gradient,
    Waves,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorSetting {
    #[default]
    Center,
    TopLeft,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ViewConfig {
    pub version: u32,
    #[serde(default)]
    pub pattern: PatternSection,
    #[serde(default)]
    pub input: InputSection,
    #[serde(default)]
    pub presentation: PresentationSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<OverlaySection>,
    #[serde(default)]
    pub wake_lock: WakeLockSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PatternSection {
    #[serde(default)]
    pub palette: PaletteSetting,
    /// Gradient start color, linear RGB in `[0, 1]`.
    #[serde(default)]
    pub low: Option<[f32; 3]>,
    /// Gradient end color.
    #[serde(default)]
    pub high: Option<[f32; 3]>,
    /// Fragment stage file replacing the bundled pattern.
    #[serde(default)]
    pub fragment: Option<PathBuf>,
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub still_time: Option<Duration>,
    /// Opacity of the pattern over the black background.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

impl Default for PatternSection {
    fn default() -> Self {
        Self {
            palette: PaletteSetting::default(),
            low: None,
            high: None,
            fragment: None,
            still_time: None,
            opacity: default_opacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InputSection {
    #[serde(default = "default_damping")]
    pub damping: f64,
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            damping: default_damping(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PresentationSection {
    #[serde(default = "default_true")]
    pub fullscreen: bool,
    #[serde(default = "default_true")]
    pub hide_cursor: bool,
}

impl Default for PresentationSection {
    fn default() -> Self {
        Self {
            fullscreen: true,
            hide_cursor: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OverlaySection {
    pub image: PathBuf,
    #[serde(default)]
    pub anchor: AnchorSetting,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WakeLockSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for WakeLockSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_damping() -> f64 {
    0.1
}

fn default_opacity() -> f32 {
    0.9
}

fn default_true() -> bool {
    true
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be finite and non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            pattern: PatternSection::default(),
            input: InputSection::default(),
            presentation: PresentationSection::default(),
            overlay: None,
            wake_lock: WakeLockSection::default(),
        }
    }
}

impl ViewConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: ViewConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Like [`ViewConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CURRENT_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CURRENT_VERSION}",
                self.version
            )));
        }

        for (name, color) in [("low", self.pattern.low), ("high", self.pattern.high)] {
            if let Some(color) = color {
                if color.iter().any(|c| !c.is_finite() || !(0.0..=1.0).contains(c)) {
                    return Err(ConfigError::Invalid(format!(
                        "pattern.{name} components must be within [0, 1], got {color:?}"
                    )));
                }
            }
        }

        if !(0.0..=1.0).contains(&self.pattern.opacity) {
            return Err(ConfigError::Invalid(format!(
                "pattern.opacity must be within [0, 1], got {}",
                self.pattern.opacity
            )));
        }

        if !self.input.damping.is_finite() || self.input.damping < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "input.damping must be a non-negative number, got {}",
                self.input.damping
            )));
        }

        if let Some(overlay) = &self.overlay {
            if overlay.image.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "overlay.image must not be empty".into(),
                ));
            }
        }

        Ok(())
    }
}
