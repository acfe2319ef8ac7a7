//! Terminal output for ccprov: labels, colors, tables and the switch spinner.
//!
//! # No-color detection (in priority order):
//! 1. `--no-color` CLI flag (highest priority)
//! 2. `NO_COLOR` environment variable (any value)
//! 3. `TERM=dumb` environment variable
//! 4. Non-TTY stdout (detected via anstream)

use anstream::{eprintln, println};
use anstyle::{AnsiColor, Color, Style};
use comfy_table::{Cell, ContentArrangement, Table, presets};
use indicatif::{ProgressBar, ProgressStyle};
use std::borrow::Cow;
use std::io::IsTerminal;
use std::time::Duration;

/// Color mode for output
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Always emit ANSI colors
    Always,
    /// Emit colors only if TTY and not disabled
    #[default]
    Auto,
    /// Never emit ANSI colors
    Never,
}

impl std::str::FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "auto" => Ok(Self::Auto),
            "never" => Ok(Self::Never),
            _ => Err(format!("invalid color mode: {}", s)),
        }
    }
}

/// UI context holding resolved display settings
#[derive(Debug, Clone)]
pub struct Ui {
    pub color_enabled: bool,
    /// Spinners need both a TTY and color
    pub spinner_enabled: bool,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new(ColorMode::Auto, false)
    }
}

impl Ui {
    pub fn new(mode: ColorMode, force_no_color: bool) -> Self {
        let color_enabled = Self::resolve_color(mode, force_no_color);
        let spinner_enabled = color_enabled && std::io::stdout().is_terminal();

        if !color_enabled {
            anstream::ColorChoice::write_global(anstream::ColorChoice::Never);
        }

        Self {
            color_enabled,
            spinner_enabled,
        }
    }

    fn resolve_color(mode: ColorMode, force_no_color: bool) -> bool {
        if force_no_color || std::env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if std::env::var("TERM").is_ok_and(|t| t == "dumb") {
            return false;
        }

        match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }

    fn style(&self, style: Style) -> Style {
        if self.color_enabled { style } else { Style::new() }
    }

    fn paint(&self, s: &str, style: Style) -> String {
        let st = self.style(style);
        format!("{st}{s}{st:#}")
    }

    fn label(&self, color: AnsiColor) -> Style {
        self.style(Style::new().fg_color(Some(Color::Ansi(color))).bold())
    }

    // -------------------------------------------------------------------------
    // Status lines
    // -------------------------------------------------------------------------

    /// Print OK label (green) with message to stdout
    pub fn ok(&self, msg: impl AsRef<str>) {
        let label = self.label(AnsiColor::Green);
        println!("{label}OK{label:#} {}", msg.as_ref());
    }

    /// Print WARN label (yellow) with message to stdout
    pub fn warn(&self, msg: impl AsRef<str>) {
        let label = self.label(AnsiColor::Yellow);
        println!("{label}WARN{label:#} {}", msg.as_ref());
    }

    /// Print ERROR label (red) with message to stderr
    pub fn err(&self, msg: impl AsRef<str>) {
        let label = self.label(AnsiColor::Red);
        eprintln!("{label}ERROR{label:#} {}", msg.as_ref());
    }

    /// Print NOTE label (cyan) with message to stdout
    pub fn note(&self, msg: impl AsRef<str>) {
        let label = self.label(AnsiColor::Cyan);
        println!("{label}NOTE{label:#} {}", msg.as_ref());
    }

    // -------------------------------------------------------------------------
    // Inline styling
    // -------------------------------------------------------------------------

    pub fn dim(&self, s: impl AsRef<str>) -> String {
        self.paint(
            s.as_ref(),
            Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))),
        )
    }

    pub fn bold(&self, s: impl AsRef<str>) -> String {
        self.paint(s.as_ref(), Style::new().bold())
    }

    /// Highlight a profile name or command
    pub fn accent(&self, s: impl AsRef<str>) -> String {
        self.colored(s, AnsiColor::Cyan)
    }

    pub fn colored(&self, s: impl AsRef<str>, color: AnsiColor) -> String {
        self.paint(s.as_ref(), Style::new().fg_color(Some(Color::Ansi(color))))
    }

    pub fn icon_ok(&self) -> &'static str {
        if self.color_enabled { "✓" } else { "[OK]" }
    }

    pub fn icon_warn(&self) -> &'static str {
        if self.color_enabled { "⚠" } else { "[!]" }
    }

    pub fn icon_err(&self) -> &'static str {
        if self.color_enabled { "✗" } else { "[X]" }
    }

    pub fn icon_info(&self) -> &'static str {
        if self.color_enabled { "•" } else { "-" }
    }

    // -------------------------------------------------------------------------
    // Tables (comfy-table)
    // -------------------------------------------------------------------------

    /// Borderless table for key/value blocks and lists
    pub fn simple_table(&self) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.load_preset(presets::NOTHING);
        table
    }

    pub fn cell(&self, content: impl Into<String>) -> Cell {
        Cell::new(content.into())
    }

    /// Bold when color is enabled
    pub fn header_cell(&self, content: impl Into<String>) -> Cell {
        let cell = Cell::new(content.into());
        if self.color_enabled {
            cell.add_attribute(comfy_table::Attribute::Bold)
        } else {
            cell
        }
    }

    /// Colored via comfy-table so column widths stay correct
    pub fn colored_cell(&self, content: impl Into<String>, color: AnsiColor) -> Cell {
        let cell = Cell::new(content.into());
        if self.color_enabled {
            cell.fg(ansi_to_comfy_color(color))
        } else {
            cell
        }
    }

    // -------------------------------------------------------------------------
    // Spinner (indicatif)
    // -------------------------------------------------------------------------

    /// Spinner for the switch; hidden when spinners are disabled
    pub fn spinner(&self, message: impl Into<Cow<'static, str>>) -> ProgressBar {
        let pb = if self.spinner_enabled {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                    .template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message);
        pb
    }

    pub fn spinner_finish_ok(&self, pb: &ProgressBar, msg: impl Into<Cow<'static, str>>) {
        self.finish_spinner(pb, msg.into(), true);
    }

    pub fn spinner_finish_err(&self, pb: &ProgressBar, msg: impl Into<Cow<'static, str>>) {
        self.finish_spinner(pb, msg.into(), false);
    }

    fn finish_spinner(&self, pb: &ProgressBar, msg: Cow<'static, str>, success: bool) {
        if !self.spinner_enabled {
            pb.finish_and_clear();
            if success { self.ok(msg) } else { self.err(msg) }
            return;
        }

        if let Ok(style) = ProgressStyle::default_spinner().template("{msg}") {
            pb.set_style(style);
        }
        let icon = if success {
            self.colored("✓", AnsiColor::Green)
        } else {
            self.colored("✗", AnsiColor::Red)
        };
        pb.finish_with_message(format!("{} {}", icon, msg));
    }

    // -------------------------------------------------------------------------
    // Println helpers (using anstream for proper tty handling)
    // -------------------------------------------------------------------------

    pub fn println(&self, msg: impl AsRef<str>) {
        println!("{}", msg.as_ref());
    }

    pub fn newline(&self) {
        println!();
    }

    pub fn section(&self, title: impl AsRef<str>) {
        println!("{}", self.bold(title));
    }
}

fn ansi_to_comfy_color(color: AnsiColor) -> comfy_table::Color {
    use comfy_table::Color as C;
    match color {
        AnsiColor::Black => C::Black,
        AnsiColor::Red | AnsiColor::BrightRed => C::Red,
        AnsiColor::Green | AnsiColor::BrightGreen => C::Green,
        AnsiColor::Yellow | AnsiColor::BrightYellow => C::Yellow,
        AnsiColor::Blue | AnsiColor::BrightBlue => C::Blue,
        AnsiColor::Magenta | AnsiColor::BrightMagenta => C::Magenta,
        AnsiColor::Cyan | AnsiColor::BrightCyan => C::Cyan,
        AnsiColor::White | AnsiColor::BrightWhite => C::White,
        AnsiColor::BrightBlack => C::DarkGrey,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mode_parse() {
        assert_eq!("always".parse::<ColorMode>().unwrap(), ColorMode::Always);
        assert_eq!("AUTO".parse::<ColorMode>().unwrap(), ColorMode::Auto);
        assert_eq!("never".parse::<ColorMode>().unwrap(), ColorMode::Never);
        assert!("sometimes".parse::<ColorMode>().is_err());
    }

    #[test]
    fn test_force_no_color_wins() {
        let ui = Ui::new(ColorMode::Always, true);
        assert!(!ui.color_enabled);
        assert!(!ui.spinner_enabled);
    }

    #[test]
    fn test_plain_output_without_color() {
        let ui = Ui::new(ColorMode::Never, false);
        assert_eq!(ui.icon_ok(), "[OK]");
        assert_eq!(ui.icon_warn(), "[!]");
        assert_eq!(ui.bold("glm"), "glm");
        assert_eq!(ui.accent("ds"), "ds");
    }

    #[test]
    fn test_hidden_spinner() {
        let ui = Ui::new(ColorMode::Never, false);
        let pb = ui.spinner("switching");
        ui.spinner_finish_ok(&pb, "done");
        assert!(pb.is_finished());
    }
}
