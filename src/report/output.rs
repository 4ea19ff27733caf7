// Formatted output - icons, ANSI styling and indentation

use std::sync::Arc;

use console::Style;

use crate::config::LoggingConfig;
use crate::error::Result;
use crate::report::sink::{LogSink, Severity};

/// Symbolic markers that may appear in report templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Rocket,
    Success,
    Failed,
    Sleep,
    SandWatch,
}

impl Icon {
    pub const ALL: [Icon; 5] = [
        Icon::Rocket,
        Icon::Success,
        Icon::Failed,
        Icon::Sleep,
        Icon::SandWatch,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Icon::Rocket => ":rocket:",
            Icon::Success => ":success:",
            Icon::Failed => ":failed:",
            Icon::Sleep => ":sleep:",
            Icon::SandWatch => ":sand_watch:",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Rocket => "\u{1F680}",
            Icon::Success => "\u{2714} ",
            Icon::Failed => "\u{1F621}",
            Icon::Sleep => "\u{1F4A4}",
            Icon::SandWatch => "\u{23F3}",
        }
    }

    pub fn plain(self) -> &'static str {
        match self {
            Icon::Rocket => "-",
            Icon::Success => "[OK]",
            Icon::Failed => "[FAIL]",
            Icon::Sleep => "[SKIP]",
            Icon::SandWatch => "[RUN]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Gray,
}

/// Renders report templates and writes them to the host sink.
///
/// Knows nothing about tests: only strings and the decoration flags.
#[derive(Clone)]
pub struct FormattedOutput {
    colors: bool,
    icons: bool,
    font_styles: bool,
    sink: Arc<dyn LogSink>,
}

impl FormattedOutput {
    pub fn new(logging: &LoggingConfig, sink: Arc<dyn LogSink>) -> Self {
        Self {
            colors: !logging.no_color,
            icons: !logging.no_icon,
            font_styles: !logging.no_font_styling,
            sink,
        }
    }

    /// Replace icon keys with glyphs or their plain-text tags
    pub fn render(&self, template: &str) -> String {
        let mut value = template.to_string();
        for icon in Icon::ALL {
            if value.contains(icon.key()) {
                let replacement = if self.icons { icon.glyph() } else { icon.plain() };
                value = value.replace(icon.key(), replacement);
            }
        }
        value
    }

    /// Wrap `text` in ANSI styling; identity when colors are off
    pub fn colorize(&self, text: &str, color: Color, bold: bool, italic: bool) -> String {
        if !self.colors {
            return text.to_string();
        }
        let mut style = Style::new().force_styling(true);
        style = match color {
            Color::Red => style.red(),
            Color::Green => style.green(),
            Color::Yellow => style.yellow(),
            Color::Blue => style.blue(),
            Color::Gray => style.black().bright(),
        };
        if self.font_styles && bold {
            style = style.bold();
        }
        if self.font_styles && italic {
            style = style.italic();
        }
        style.apply_to(text).to_string()
    }

    pub fn red(&self, text: &str) -> String {
        self.colorize(text, Color::Red, false, false)
    }

    pub fn green(&self, text: &str) -> String {
        self.colorize(text, Color::Green, false, false)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.colorize(text, Color::Yellow, false, false)
    }

    pub fn blue(&self, text: &str) -> String {
        self.colorize(text, Color::Blue, false, false)
    }

    pub fn gray(&self, text: &str) -> String {
        self.colorize(text, Color::Gray, false, false)
    }

    pub fn italic(&self, text: &str, color: Color) -> String {
        self.colorize(text, color, false, true)
    }

    /// Indent, render icons and write one line at `severity`
    pub fn display(&self, text: &str, indent: usize, severity: Severity) -> Result<()> {
        let line = self.render(&format!("{}{}", " ".repeat(indent), text));
        self.sink.write(severity, &line)
    }

    pub fn blank(&self) -> Result<()> {
        self.sink.write(Severity::Quiet, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::sink::MemorySink;

    fn output(configure: impl FnOnce(&mut LoggingConfig)) -> (FormattedOutput, Arc<MemorySink>) {
        let mut logging = LoggingConfig::default();
        configure(&mut logging);
        let sink = Arc::new(MemorySink::new());
        (FormattedOutput::new(&logging, sink.clone()), sink)
    }

    #[test]
    fn test_render_uses_glyphs_by_default() {
        let (out, _) = output(|_| {});
        assert_eq!(out.render(":rocket:  app"), "\u{1F680}  app");
        assert_eq!(out.render(":sand_watch: t"), "\u{23F3} t");
    }

    #[test]
    fn test_render_plain_fallbacks() {
        let (out, _) = output(|l| l.no_icon = true);
        assert_eq!(
            out.render(":rocket: :success: :failed: :sleep: :sand_watch:"),
            "- [OK] [FAIL] [SKIP] [RUN]"
        );
    }

    #[test]
    fn test_render_unknown_key_passes_through() {
        let (out, _) = output(|_| {});
        assert_eq!(out.render(":unicorn: ok"), ":unicorn: ok");
    }

    #[test]
    fn test_colorize_identity_without_color() {
        let (out, _) = output(|l| l.no_color = true);
        assert_eq!(out.colorize("text", Color::Red, true, true), "text");
    }

    #[test]
    fn test_colorize_wraps_with_escape() {
        let (out, _) = output(|_| {});
        let styled = out.colorize("text", Color::Red, false, false);
        assert!(styled.contains('\u{1b}'));
        assert!(styled.contains("text"));
        assert_ne!(styled, out.colorize("text", Color::Gray, false, false));
    }

    #[test]
    fn test_font_styling_toggle() {
        let (styled, _) = output(|_| {});
        let (flat, _) = output(|l| l.no_font_styling = true);
        assert_ne!(
            styled.colorize("t", Color::Gray, false, true),
            styled.colorize("t", Color::Gray, false, false)
        );
        assert_eq!(
            flat.colorize("t", Color::Gray, true, true),
            flat.colorize("t", Color::Gray, false, false)
        );
    }

    #[test]
    fn test_display_indents_and_routes_severity() {
        let (out, sink) = output(|l| l.plain());
        out.display(":success: done", 5, Severity::Warn).unwrap();
        assert_eq!(
            sink.entries(),
            vec![(Severity::Warn, "     [OK] done".to_string())]
        );
    }

    #[test]
    fn test_plain_output_has_no_escapes() {
        let (out, sink) = output(|l| l.plain());
        let text = format!("{} {}", out.red(":failed:"), out.italic("[2s]", Color::Gray));
        out.display(&text, 0, Severity::Lifecycle).unwrap();
        let line = &sink.lines()[0];
        assert!(!line.contains('\u{1b}'));
        assert_eq!(line, "[FAIL] [2s]");
    }
}
