//! Token styles and colour palettes for syntax highlighting.

use std::collections::HashMap;

/// Token style categories produced by the lexical highlighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenStyle {
    /// Reserved words (def, if, return, ...)
    Keyword,
    /// Names from the builtins module (print, len, ...)
    Builtin,
    /// Operators (+, -, ==, ...)
    Operator,
    /// Brackets of every kind
    Bracket,
    /// String literals, including triple-quoted blocks
    String,
    Comment,
    Number,
    /// `@decorator` markers
    Decorator,
    /// The name introduced by `def` or `class`
    Definition,
    /// Default text (no special highlighting)
    Default,
}

/// RGBA color represented as [r, g, b, a] with values 0.0-1.0.
pub type Color = [f32; 4];

fn rgb(r: u8, g: u8, b: u8) -> Color {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}

/// A syntax highlighting theme.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub background: Color,
    /// Default text color.
    pub foreground: Color,
    /// Background painted behind a matched bracket pair.
    pub bracket_match: Color,
    /// Underline colour for diagnostics.
    pub error: Color,
    colors: HashMap<TokenStyle, Color>,
}

impl Theme {
    /// Creates a new theme with the given name and no token colours.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            background: rgb(0x1e, 0x1e, 0x1e),
            foreground: rgb(0xd4, 0xd4, 0xd4),
            bracket_match: rgb(0x49, 0x48, 0x3e),
            error: rgb(0xff, 0x00, 0x00),
            colors: HashMap::new(),
        }
    }

    /// Sets the color for a token style.
    pub fn set_color(&mut self, style: TokenStyle, color: Color) {
        self.colors.insert(style, color);
    }

    /// Gets the color for a token style, falling back to foreground.
    pub fn color(&self, style: TokenStyle) -> Color {
        self.colors.get(&style).copied().unwrap_or(self.foreground)
    }

    /// The default dark palette.
    pub fn dark() -> Self {
        let mut theme = Self::new("Dark");

        theme.set_color(TokenStyle::Keyword, rgb(86, 156, 214));
        theme.set_color(TokenStyle::Builtin, rgb(220, 220, 170));
        theme.set_color(TokenStyle::Operator, rgb(212, 212, 212));
        theme.set_color(TokenStyle::Bracket, rgb(212, 212, 212));
        theme.set_color(TokenStyle::String, rgb(214, 157, 133));
        theme.set_color(TokenStyle::Comment, rgb(87, 166, 74));
        theme.set_color(TokenStyle::Number, rgb(181, 206, 168));
        theme.set_color(TokenStyle::Decorator, rgb(155, 155, 255));
        theme.set_color(TokenStyle::Definition, rgb(78, 201, 176));
        theme.set_color(TokenStyle::Default, theme.foreground);

        theme
    }

    /// A light palette.
    pub fn light() -> Self {
        let mut theme = Self::new("Light");

        theme.background = rgb(0xfb, 0xfb, 0xfb);
        theme.foreground = rgb(0x3b, 0x42, 0x52);
        theme.bracket_match = rgb(0xdd, 0xdd, 0xc8);

        theme.set_color(TokenStyle::Keyword, rgb(0x00, 0x00, 0xff));
        theme.set_color(TokenStyle::Builtin, rgb(0x79, 0x5e, 0x26));
        theme.set_color(TokenStyle::Operator, rgb(0x3b, 0x42, 0x52));
        theme.set_color(TokenStyle::Bracket, rgb(0x3b, 0x42, 0x52));
        theme.set_color(TokenStyle::String, rgb(0xa3, 0x15, 0x15));
        theme.set_color(TokenStyle::Comment, rgb(0x00, 0x80, 0x00));
        theme.set_color(TokenStyle::Number, rgb(0x09, 0x86, 0x58));
        theme.set_color(TokenStyle::Decorator, rgb(0x80, 0x00, 0x80));
        theme.set_color(TokenStyle::Definition, rgb(0x26, 0x7f, 0x99));
        theme.set_color(TokenStyle::Default, theme.foreground);

        theme
    }

    /// Looks up a built-in palette by (case-insensitive) name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_theme() {
        let theme = Theme::dark();
        assert_eq!(theme.name, "Dark");

        let keyword_color = theme.color(TokenStyle::Keyword);
        let default_color = theme.color(TokenStyle::Default);
        assert_ne!(keyword_color, default_color);
    }

    #[test]
    fn test_by_name() {
        assert_eq!(Theme::by_name("LIGHT").map(|t| t.name), Some("Light".to_string()));
        assert!(Theme::by_name("solarized").is_none());
    }

    #[test]
    fn test_fallback_color() {
        let theme = Theme::new("Test");
        assert_eq!(theme.color(TokenStyle::Keyword), theme.foreground);
    }
}
