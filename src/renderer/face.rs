use super::glyphs;

/// How the match clock is drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum FaceStyle {
    /// Block digits five rows tall
    Big,
    /// Plain text, for small terminals
    Compact,
}

impl FaceStyle {
    pub fn lines(self, text: &str) -> Vec<String> {
        match self {
            FaceStyle::Big => glyphs::render_big(text),
            FaceStyle::Compact => vec![text.to_string()],
        }
    }

    /// Columns needed to draw `text`.
    pub fn width(self, text: &str) -> usize {
        match self {
            FaceStyle::Big => glyphs::big_width(text),
            FaceStyle::Compact => text.chars().count(),
        }
    }

    /// `self` when `text` fits in `columns`, otherwise the compact face.
    pub fn fitting(self, text: &str, columns: u16) -> FaceStyle {
        if self.width(text) <= usize::from(columns) {
            self
        } else {
            FaceStyle::Compact
        }
    }

    pub fn height(self) -> u16 {
        match self {
            FaceStyle::Big => glyphs::GLYPH_HEIGHT as u16,
            FaceStyle::Compact => 1,
        }
    }
}
