/// Height of every glyph in terminal rows.
pub const GLYPH_HEIGHT: usize = 5;

const FILL: char = '█';

// 3x5 bitmaps, '#' is lit.
const DIGITS: [[&str; GLYPH_HEIGHT]; 10] = [
    ["###", "# #", "# #", "# #", "###"],
    ["  #", "  #", "  #", "  #", "  #"],
    ["###", "  #", "###", "#  ", "###"],
    ["###", "  #", "###", "  #", "###"],
    ["# #", "# #", "###", "  #", "  #"],
    ["###", "#  ", "###", "  #", "###"],
    ["###", "#  ", "###", "# #", "###"],
    ["###", "  #", "  #", "  #", "  #"],
    ["###", "# #", "###", "# #", "###"],
    ["###", "# #", "###", "  #", "###"],
];

const COLON: [&str; GLYPH_HEIGHT] = [" ", "#", " ", "#", " "];
const BLANK: [&str; GLYPH_HEIGHT] = ["   ", "   ", "   ", "   ", "   "];

fn bitmap(c: char) -> [&'static str; GLYPH_HEIGHT] {
    match c {
        '0'..='9' => DIGITS[c as usize - '0' as usize],
        ':' => COLON,
        _ => BLANK,
    }
}

/// Render a clock string such as `"28:30"` as large block glyphs.
///
/// Every cell is doubled horizontally so the digits keep their shape in
/// terminal cells, which are about twice as tall as wide. Returns exactly
/// [`GLYPH_HEIGHT`] lines of equal width.
pub fn render_big(text: &str) -> Vec<String> {
    let mut rows = vec![String::new(); GLYPH_HEIGHT];

    for (idx, c) in text.chars().enumerate() {
        let glyph = bitmap(c);
        for (row, pattern) in rows.iter_mut().zip(glyph.iter()) {
            if idx > 0 {
                row.push(' ');
            }
            for px in pattern.chars() {
                let cell = if px == '#' { FILL } else { ' ' };
                row.push(cell);
                row.push(cell);
            }
        }
    }

    rows
}

/// Width in columns of [`render_big`] output for `text`.
pub fn big_width(text: &str) -> usize {
    text.chars()
        .enumerate()
        .map(|(idx, c)| bitmap(c)[0].chars().count() * 2 + usize::from(idx > 0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_have_equal_width() {
        for text in ["00:00", "1:02:05", "30:00", "7"] {
            let rows = render_big(text);
            assert_eq!(rows.len(), GLYPH_HEIGHT);
            let width = big_width(text);
            assert!(rows.iter().all(|r| r.chars().count() == width), "{}", text);
        }
    }

    #[test]
    fn one_is_a_single_bar_on_the_right() {
        let rows = render_big("1");
        assert!(rows.iter().all(|r| r == "    ██"));
    }

    #[test]
    fn colon_lights_two_dots() {
        let rows = render_big(":");
        let lit: Vec<bool> = rows.iter().map(|r| r.contains(FILL)).collect();
        assert_eq!(lit, vec![false, true, false, true, false]);
    }
}
