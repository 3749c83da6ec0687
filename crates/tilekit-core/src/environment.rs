//! # Environment
//!
//! Process-wide settings every widget falls back on:
//!
//! - the default border thickness and draw [`Options`] per [`WidgetClass`],
//! - the glyph sentinels (drop-down arrow, scroll arrow, text cursor and the
//!   focus-change character injected into input hooks),
//! - an optional translation hook applied to static labels.
//!
//! Settings are usually fixed at startup, either in code through
//! [`configure`] or from a JSON document:
//!
//! ```
//! tilekit_core::Environment::load_json(r##"{
//!     "classes": { "push": { "thickness": 3, "fill": "#EEEEEE" } },
//!     "glyphs": { "cursor": "_" }
//! }"##).unwrap();
//! assert_eq!(tilekit_core::environment().glyphs.cursor, '_');
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::{RwLock, RwLockReadGuard};
use serde::Deserialize;

use crate::{Color, DrawStyle, Error, Options, Result, WidgetClass};

#[derive(Clone, Debug, Default)]
pub struct ClassDefaults {
    /// Per-mille of the larger root dimension.
    pub thickness: i32,
    pub options: Options,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyphs {
    pub down_arrow: char,
    pub up_arrow: char,
    pub cursor: char,
    pub focus_change: char,
}

impl Default for Glyphs {
    fn default() -> Self {
        Self {
            down_arrow: '\u{25BC}',
            up_arrow: '\u{25B2}',
            cursor: '|',
            focus_change: '\0',
        }
    }
}

pub type Translator = Arc<dyn Fn(&str) -> String + Send + Sync>;

pub struct Environment {
    defaults: [ClassDefaults; WidgetClass::COUNT],
    pub glyphs: Glyphs,
    translator: Option<Translator>,
}

impl Default for Environment {
    fn default() -> Self {
        let defaults = WidgetClass::ALL.map(|class| ClassDefaults {
            thickness: match class {
                WidgetClass::Dialog | WidgetClass::Push | WidgetClass::List => 2,
                _ => 0,
            },
            options: Options::Style(DrawStyle::default()),
        });
        Self {
            defaults,
            glyphs: Glyphs::default(),
            translator: None,
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("defaults", &self.defaults)
            .field("glyphs", &self.glyphs)
            .field("translator", &self.translator.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Environment {
    pub fn defaults(&self, class: WidgetClass) -> &ClassDefaults {
        &self.defaults[class.index()]
    }

    pub fn set_defaults(&mut self, class: WidgetClass, defaults: ClassDefaults) {
        self.defaults[class.index()] = defaults;
    }

    pub fn set_translator(&mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) {
        self.translator = Some(Arc::new(f));
    }

    pub fn translate(&self, s: &str) -> String {
        match &self.translator {
            Some(f) => f(s),
            None => s.to_string(),
        }
    }

    /// Apply a JSON [`EnvironmentConfig`] to the global environment.
    pub fn load_json(json: &str) -> Result<()> {
        let config: EnvironmentConfig = serde_json::from_str(json)?;
        let mut env = global().write();
        config.apply(&mut env)
    }
}

/// Overrides read at startup.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentConfig {
    pub classes: BTreeMap<String, ClassConfig>,
    pub glyphs: GlyphConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassConfig {
    pub thickness: Option<i32>,
    pub fill: Option<String>,
    pub line: Option<String>,
    pub text: Option<String>,
    pub selected_fill: Option<String>,
    pub bold: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlyphConfig {
    pub down_arrow: Option<char>,
    pub up_arrow: Option<char>,
    pub cursor: Option<char>,
    pub focus_change: Option<char>,
}

impl EnvironmentConfig {
    pub fn apply(&self, env: &mut Environment) -> Result<()> {
        for (name, cfg) in &self.classes {
            let class: WidgetClass = name
                .parse()
                .map_err(|_| Error::InvalidConfig(format!("unknown widget class '{name}'")))?;
            if let Some(t) = cfg.thickness
                && !(-1..=1000).contains(&t)
            {
                return Err(Error::InvalidConfig(format!(
                    "thickness {t} of '{name}' is not a per-mille value"
                )));
            }
            let current = env.defaults(class).clone();
            let mut style = current.options.style().copied().unwrap_or_default();
            let color = |c: &Option<String>, into: &mut Color| -> Result<()> {
                if let Some(hex) = c {
                    *into = Color::parse_hex(hex).ok_or_else(|| {
                        Error::InvalidConfig(format!("bad color {hex:?} for '{name}'"))
                    })?;
                }
                Ok(())
            };
            color(&cfg.fill, &mut style.fill)?;
            color(&cfg.line, &mut style.line)?;
            color(&cfg.text, &mut style.text)?;
            color(&cfg.selected_fill, &mut style.selected_fill)?;
            if let Some(bold) = cfg.bold {
                style.bold = bold;
            }
            env.set_defaults(
                class,
                ClassDefaults {
                    thickness: cfg.thickness.unwrap_or(current.thickness),
                    options: Options::Style(style),
                },
            );
        }
        let g = &self.glyphs;
        let glyphs = &mut env.glyphs;
        glyphs.down_arrow = g.down_arrow.unwrap_or(glyphs.down_arrow);
        glyphs.up_arrow = g.up_arrow.unwrap_or(glyphs.up_arrow);
        glyphs.cursor = g.cursor.unwrap_or(glyphs.cursor);
        glyphs.focus_change = g.focus_change.unwrap_or(glyphs.focus_change);
        log::debug!("environment configured: {} class override(s)", self.classes.len());
        Ok(())
    }
}

static ENVIRONMENT: OnceLock<RwLock<Environment>> = OnceLock::new();

fn global() -> &'static RwLock<Environment> {
    ENVIRONMENT.get_or_init(|| RwLock::new(Environment::default()))
}

/// Read access to the process-wide environment. Do not hold the guard
/// across calls that may [`configure`] it.
pub fn environment() -> RwLockReadGuard<'static, Environment> {
    global().read()
}

pub fn configure<R>(f: impl FnOnce(&mut Environment) -> R) -> R {
    f(&mut global().write())
}
