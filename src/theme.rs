//! Color themes for flowchart drawing
//!
//! A theme maps every block kind to a palette (background, border, text and
//! glow colors) and carries the canvas and arrow colors. Themes are loaded
//! from TOML; anything a theme file leaves out falls back to the built-in
//! midnight palette.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::NodeKind;

/// Errors that can occur when loading or parsing themes
#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("Failed to read theme file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse theme TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Unknown block kind '{0}' in theme palettes")]
    UnknownKind(String),
}

/// The four colors a block is drawn with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub background: String,
    pub border: String,
    pub text: String,
    pub glow: String,
}

impl Palette {
    pub fn new(
        background: impl Into<String>,
        border: impl Into<String>,
        text: impl Into<String>,
        glow: impl Into<String>,
    ) -> Self {
        Self {
            background: background.into(),
            border: border.into(),
            text: text.into(),
            glow: glow.into(),
        }
    }
}

/// Colors used for connections and their labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrowColors {
    pub color: String,
    pub label: String,
    pub label_background: String,
    pub label_border: String,
}

impl Default for ArrowColors {
    fn default() -> Self {
        Self {
            color: "#6366f1".to_string(),
            label: "#a5b4fc".to_string(),
            label_background: "rgba(10,10,15,0.85)".to_string(),
            label_border: "rgba(255,255,255,0.08)".to_string(),
        }
    }
}

/// Colors of the drawing surface itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasColors {
    pub background: String,
    pub grid: String,
    pub selection: String,
}

impl Default for CanvasColors {
    fn default() -> Self {
        Self {
            background: "#0a0a0f".to_string(),
            grid: "rgba(255,255,255,0.02)".to_string(),
            selection: "#f472b6".to_string(),
        }
    }
}

/// A complete theme
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Optional name for the theme
    pub name: Option<String>,
    pub canvas: CanvasColors,
    pub arrow: ArrowColors,
    palettes: HashMap<NodeKind, Palette>,
}

/// TOML structure for deserializing themes; every section is optional
#[derive(Deserialize)]
struct TomlTheme {
    metadata: Option<TomlMetadata>,
    canvas: Option<CanvasColors>,
    arrow: Option<ArrowColors>,
    #[serde(default)]
    palettes: HashMap<String, Palette>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
}

/// Default palette - dark canvas with indigo arrows
const DEFAULT_THEME: &str = r##"
[metadata]
name = "midnight"

[palettes.terminator]
background = "#1a1a2e"
border = "#7c3aed"
text = "#e0e0ff"
glow = "rgba(124,58,237,0.2)"

[palettes.terminator_start]
background = "#1a1a2e"
border = "#7c3aed"
text = "#e0e0ff"
glow = "rgba(124,58,237,0.2)"

[palettes.terminator_end]
background = "#1a1a2e"
border = "#ef4444"
text = "#fecaca"
glow = "rgba(239,68,68,0.2)"

[palettes.process]
background = "#111827"
border = "#3b82f6"
text = "#bfdbfe"
glow = "rgba(59,130,246,0.15)"

[palettes.decision]
background = "#1c1917"
border = "#f59e0b"
text = "#fde68a"
glow = "rgba(245,158,11,0.15)"

[palettes.io]
background = "#0f172a"
border = "#06b6d4"
text = "#a5f3fc"
glow = "rgba(6,182,212,0.15)"

[palettes.connector]
background = "#1e1b4b"
border = "#818cf8"
text = "#c7d2fe"
glow = "rgba(129,140,248,0.15)"

[palettes.sub_block]
background = "#1a1a2e"
border = "#8b5cf6"
text = "#ddd6fe"
glow = "rgba(139,92,246,0.15)"
"##;

impl Theme {
    /// Load a theme from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ThemeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a theme from a TOML string, filling gaps from the default theme
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ThemeError> {
        let parsed: TomlTheme = toml::from_str(content)?;
        let mut theme = Self::builtin()?;
        theme.merge(parsed)?;
        Ok(theme)
    }

    fn builtin() -> Result<Self, ThemeError> {
        let parsed: TomlTheme = toml::from_str(DEFAULT_THEME)?;
        let mut theme = Theme {
            name: None,
            canvas: CanvasColors::default(),
            arrow: ArrowColors::default(),
            palettes: HashMap::new(),
        };
        theme.merge(parsed)?;
        Ok(theme)
    }

    fn merge(&mut self, parsed: TomlTheme) -> Result<(), ThemeError> {
        if let Some(name) = parsed.metadata.and_then(|m| m.name) {
            self.name = Some(name);
        }
        if let Some(canvas) = parsed.canvas {
            self.canvas = canvas;
        }
        if let Some(arrow) = parsed.arrow {
            self.arrow = arrow;
        }
        for (key, palette) in parsed.palettes {
            let kind = NodeKind::from_name(&key).ok_or(ThemeError::UnknownKind(key))?;
            self.palettes.insert(kind, palette);
        }
        Ok(())
    }

    /// Palette for a block kind
    ///
    /// Kinds missing from the theme use the process palette.
    pub fn palette(&self, kind: NodeKind) -> &Palette {
        self.palettes
            .get(&kind)
            .or_else(|| self.palettes.get(&NodeKind::Process))
            .unwrap_or(&FALLBACK_PALETTE)
    }
}

static FALLBACK_PALETTE: Palette = Palette {
    background: String::new(),
    border: String::new(),
    text: String::new(),
    glow: String::new(),
};

impl Default for Theme {
    fn default() -> Self {
        Self::builtin().expect("Default theme should be valid TOML")
    }
}
