//! Theme tokens applied once at startup
//!
//! The theme is a fixed list of CSS custom properties. Applying it is an
//! explicit step against a [`ThemeSurface`]; for the HTML viewer the surface
//! is a [`StyleSheet`] emitted into the document head.

use std::collections::BTreeMap;
use tracing::warn;

/// Default palette: (theme key, CSS variable, value)
pub const DEFAULT_THEME: &[(&str, &str, &str)] = &[
    ("accent", "--accent", "#6366f1"),
    ("accentMuted", "--accent-muted", "#eef2ff"),
    ("accentText", "--accent-text", "#312e81"),
    ("surface", "--surface", "#ffffff"),
    ("surfaceSubtle", "--surface-subtle", "#f8fafc"),
    ("textPrimary", "--text-primary", "#0f172a"),
    ("textMuted", "--text-muted", "#475569"),
    ("borderSubtle", "--border-subtle", "#e2e8f0"),
    ("dangerMuted", "--danger-muted", "#fee2e2"),
    ("dangerText", "--danger-text", "#991b1b"),
    ("shadowXs", "--shadow-xs", "0 1px 2px rgba(15, 23, 42, 0.08)"),
    ("shadowSm", "--shadow-sm", "0 10px 30px rgba(15, 23, 42, 0.08)"),
    ("shadowLg", "--shadow-lg", "0 30px 40px rgba(15, 23, 42, 0.12)"),
];

/// Anything theme variables can be written to
pub trait ThemeSurface {
    fn set_property(&mut self, name: &str, value: &str);
}

/// One resolved theme variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeToken {
    pub key: String,
    pub css_var: String,
    pub value: String,
}

/// Resolved theme, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    tokens: Vec<ThemeToken>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            tokens: DEFAULT_THEME
                .iter()
                .map(|(key, css_var, value)| ThemeToken {
                    key: key.to_string(),
                    css_var: css_var.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }
}

impl Theme {
    /// Default theme with values replaced by theme key; unknown keys are skipped
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut theme = Self::default();

        for (key, value) in overrides {
            match theme.tokens.iter_mut().find(|token| &token.key == key) {
                Some(token) => token.value = value.clone(),
                None => warn!("Ignoring unknown theme key: {}", key),
            }
        }

        theme
    }

    pub fn tokens(&self) -> &[ThemeToken] {
        &self.tokens
    }

    /// Value for a theme key such as `accent`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tokens
            .iter()
            .find(|token| token.key == key)
            .map(|token| token.value.as_str())
    }

    /// Write every variable to `surface`
    pub fn apply(&self, surface: &mut impl ThemeSurface) {
        for token in &self.tokens {
            surface.set_property(&token.css_var, &token.value);
        }
    }
}

/// `:root` rule collecting custom properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    properties: Vec<(String, String)>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stylesheet with `theme` already applied
    pub fn from_theme(theme: &Theme) -> Self {
        let mut sheet = Self::new();
        theme.apply(&mut sheet);
        sheet
    }

    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// Render as CSS text
    pub fn to_css(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, value) in &self.properties {
            css.push_str(&format!("  {}: {};\n", name, value));
        }
        css.push('}');
        css
    }
}

impl ThemeSurface for StyleSheet {
    fn set_property(&mut self, name: &str, value: &str) {
        match self.properties.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, current)) => *current = value.to_string(),
            None => self.properties.push((name.to_string(), value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme_applies_every_variable() {
        let sheet = StyleSheet::from_theme(&Theme::default());

        assert_eq!(sheet.properties().len(), DEFAULT_THEME.len());
        let css = sheet.to_css();
        assert!(css.starts_with(":root {"));
        assert!(css.contains("  --accent: #6366f1;"));
        assert!(css.contains("--shadow-lg: 0 30px 40px rgba(15, 23, 42, 0.12);"));
    }

    #[test]
    fn test_overrides_replace_known_keys_only() {
        let overrides: BTreeMap<String, String> = [
            ("accent".to_string(), "#ff0000".to_string()),
            ("nonsense".to_string(), "1px".to_string()),
        ]
        .into_iter()
        .collect();

        let theme = Theme::with_overrides(&overrides);

        assert_eq!(theme.get("accent"), Some("#ff0000"));
        assert_eq!(theme.get("nonsense"), None);
        assert_eq!(theme.tokens().len(), DEFAULT_THEME.len());
    }

    #[test]
    fn test_applying_twice_does_not_duplicate() {
        let theme = Theme::default();
        let mut sheet = StyleSheet::new();
        theme.apply(&mut sheet);
        theme.apply(&mut sheet);

        assert_eq!(sheet.properties().len(), DEFAULT_THEME.len());
    }
}
