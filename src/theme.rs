//! Mermaid theme presets.
//!
//! Presets live in a read-only table that the converter borrows; nothing
//! here is ever mutated after startup.

use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    #[default]
    Default,
    Dark,
    Neutral,
    Forest,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Self::Default, Self::Dark, Self::Neutral, Self::Forest];

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dark => "dark",
            Self::Neutral => "neutral",
            Self::Forest => "forest",
        }
    }
}

impl FromStr for Theme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownTheme(s.to_string()))
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A theme and the Mermaid `themeVariables` it sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemePreset {
    pub theme: Theme,
    pub variables: &'static [(&'static str, &'static str)],
}

impl ThemePreset {
    /// `%%{init: {'theme': 'dark', 'themeVariables': {...}}}%%`
    pub fn directive(&self) -> String {
        let vars = self
            .variables
            .iter()
            .map(|(k, v)| format!("'{}': '{}'", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "%%{{init: {{'theme': '{}', 'themeVariables': {{{}}}}}}}%%",
            self.theme.name(),
            vars
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ThemeRegistry {
    presets: &'static [ThemePreset],
}

static BUILTIN_PRESETS: [ThemePreset; 3] = [
    ThemePreset {
        theme: Theme::Dark,
        variables: &[
            ("primaryColor", "#2A2A2A"),
            ("primaryTextColor", "#E0E0E0"),
            ("primaryBorderColor", "#555555"),
            ("secondaryColor", "#3A3A3A"),
            ("tertiaryColor", "#1E1E1E"),
            ("lineColor", "#AAAAAA"),
        ],
    },
    ThemePreset {
        theme: Theme::Neutral,
        variables: &[
            ("primaryColor", "#F4F4F4"),
            ("primaryTextColor", "#333333"),
            ("primaryBorderColor", "#999999"),
            ("secondaryColor", "#E8E8E8"),
            ("tertiaryColor", "#FFFFFF"),
            ("lineColor", "#666666"),
        ],
    },
    ThemePreset {
        theme: Theme::Forest,
        variables: &[
            ("primaryColor", "#CDE498"),
            ("primaryTextColor", "#13540C"),
            ("primaryBorderColor", "#13540C"),
            ("secondaryColor", "#CDFFB2"),
            ("tertiaryColor", "#F4FCEB"),
            ("lineColor", "#6EAA49"),
        ],
    },
];

static BUILTIN: ThemeRegistry = ThemeRegistry::new(&BUILTIN_PRESETS);

impl ThemeRegistry {
    pub const fn new(presets: &'static [ThemePreset]) -> Self {
        Self { presets }
    }

    /// Presets for dark, neutral and forest. `Default` has none.
    pub fn builtin() -> &'static ThemeRegistry {
        &BUILTIN
    }

    pub fn preset(&self, theme: Theme) -> Option<&ThemePreset> {
        self.presets.iter().find(|p| p.theme == theme)
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        BUILTIN
    }
}
