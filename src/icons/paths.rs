use crate::core::models::{AnimationKind, Theme};
use crate::icons::IconError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const FRAME_PLACEHOLDER: &str = "{s}";

const ASSET_DIR: &str = "assets/images/menubar icons";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PathPattern(PathBuf);

impl PathPattern {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, IconError> {
        let path = path.into();
        let found = path.to_string_lossy().matches(FRAME_PLACEHOLDER).count();
        if found != 1 {
            return Err(IconError::PlaceholderCount {
                pattern: path.display().to_string(),
                found,
            });
        }
        Ok(Self(path))
    }

    #[allow(dead_code)]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn interpolate(&self, index: u32) -> PathBuf {
        PathBuf::from(
            self.0
                .to_string_lossy()
                .replacen(FRAME_PLACEHOLDER, &index.to_string(), 1),
        )
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemedPatterns {
    pub light: String,
    pub dark: String,
}

impl ThemedPatterns {
    pub fn new(light: impl Into<String>, dark: impl Into<String>) -> Self {
        Self {
            light: light.into(),
            dark: dark.into(),
        }
    }

    fn default_lock() -> Self {
        Self::new(
            "light ui/lock/lock-{s}-light.png",
            "dark ui/lock/lock-{s}-dark.png",
        )
    }

    fn default_spinner() -> Self {
        Self::new(
            "light ui/spinner/spinner-{s}-light.png",
            "dark ui/spinner/spinner-{s}-dark.png",
        )
    }

    pub fn for_theme(&self, theme: Theme) -> &str {
        match theme {
            Theme::Light => &self.light,
            Theme::Dark => &self.dark,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PatternOverrides {
    light: Option<String>,
    dark: Option<String>,
}

impl PatternOverrides {
    fn apply(self, defaults: ThemedPatterns) -> ThemedPatterns {
        ThemedPatterns {
            light: self.light.unwrap_or(defaults.light),
            dark: self.dark.unwrap_or(defaults.dark),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IconPathTableFile {
    base_dir: Option<PathBuf>,
    lock: PatternOverrides,
    spinner: PatternOverrides,
}

impl From<IconPathTableFile> for IconPathTable {
    fn from(file: IconPathTableFile) -> Self {
        Self {
            base_dir: file.base_dir.unwrap_or_else(default_base_dir),
            lock: file.lock.apply(ThemedPatterns::default_lock()),
            spinner: file.spinner.apply(ThemedPatterns::default_spinner()),
        }
    }
}

/// Defaults mirror the bundled asset layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IconPathTableFile")]
pub struct IconPathTable {
    pub base_dir: PathBuf,
    pub lock: ThemedPatterns,
    pub spinner: ThemedPatterns,
}

impl Default for IconPathTable {
    fn default() -> Self {
        IconPathTableFile::default().into()
    }
}

impl IconPathTable {
    #[allow(dead_code)]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn patterns(&self, kind: AnimationKind) -> &ThemedPatterns {
        match kind {
            AnimationKind::Lock => &self.lock,
            AnimationKind::Spinner => &self.spinner,
        }
    }

    // Only meaningful on a table that passed `validate`.
    pub fn resolve(&self, kind: AnimationKind, theme: Theme) -> PathPattern {
        let pattern = PathPattern(self.join(kind, theme));
        tracing::debug!(
            kind = kind.name(),
            theme = theme.name(),
            pattern = %pattern,
            "Resolved animation path pattern"
        );
        pattern
    }

    pub fn validate(&self) -> Result<(), IconError> {
        for kind in [AnimationKind::Lock, AnimationKind::Spinner] {
            for theme in [Theme::Light, Theme::Dark] {
                PathPattern::new(self.join(kind, theme))?;
            }
        }
        Ok(())
    }

    fn join(&self, kind: AnimationKind, theme: Theme) -> PathBuf {
        self.base_dir.join(self.patterns(kind).for_theme(theme))
    }
}

fn default_base_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("menubar-icons").join(ASSET_DIR))
        .unwrap_or_else(|| PathBuf::from(ASSET_DIR))
}
