use clap::ValueEnum;
use defscope_core::MarkedToken;
use defscope_core::Segment;
use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

/// Terminal styling. With colors off every method returns its input.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(choice: ColorChoice) -> Self {
        let enabled = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => supports_color::on_cached(supports_color::Stream::Stdout)
                .is_some_and(|level| level.has_basic),
        };
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn heading(self, text: &str) -> String {
        if self.enabled {
            text.bright_blue().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn accent(self, text: &str) -> String {
        if self.enabled {
            text.bright_cyan().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn dim(self, text: &str) -> String {
        if self.enabled {
            text.bright_black().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn ok(self, text: &str) -> String {
        if self.enabled {
            text.bright_green().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn warn(self, text: &str) -> String {
        if self.enabled {
            text.bright_yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn mark(self, text: &str) -> String {
        if self.enabled {
            text.black().on_yellow().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn segments(self, segments: &[Segment]) -> String {
        segments
            .iter()
            .map(|segment| {
                if segment.marked {
                    self.mark(&segment.text)
                } else {
                    segment.text.clone()
                }
            })
            .collect()
    }

    /// Raw markup with marks applied inside tokens.
    pub fn markup(self, tokens: &[MarkedToken]) -> String {
        tokens
            .iter()
            .map(|token| self.segments(&token.segments))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defscope_core::highlight::highlight;
    use defscope_core::highlight::tokenize;
    use defscope_core::markup::highlight_markup;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_palette_keeps_text() {
        let palette = Palette::plain();
        let segments = highlight("Shotgun", &tokenize("gun"));
        assert_eq!(palette.segments(&segments), "Shotgun");
        let markup = "<li Class=\"A\">x</li>";
        assert_eq!(palette.markup(&highlight_markup(markup, &tokenize("x"))), markup);
    }

    #[test]
    fn colored_palette_styles_marks() {
        let palette = Palette::new(ColorChoice::Always);
        let rendered = palette.segments(&highlight("Shotgun", &tokenize("gun")));
        assert!(rendered.starts_with("Shot"));
        assert!(rendered.contains("\u{1b}["));
    }
}
