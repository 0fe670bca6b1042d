//! 5x7 bitmap font used to put labels on raster frames.
//!
//! Letters are drawn upper-case; characters without a glyph render as `?`.

use image::{Rgb, RgbImage};

const GLYPH_WIDTH: i64 = 5;
const GLYPH_HEIGHT: i64 = 7;
const ADVANCE: i64 = GLYPH_WIDTH + 1;

/// Integer scale for a font size in pixels, never below 1.
pub(crate) fn scale_for(size_px: f64) -> i64 {
    ((size_px / GLYPH_HEIGHT as f64).floor() as i64).max(1)
}

/// Draws `text` with its baseline at `y`. Pixels outside the image are skipped.
pub(crate) fn draw_text(image: &mut RgbImage, text: &str, x: f64, y: f64, size_px: f64, color: Rgb<u8>) {
    let scale = scale_for(size_px);
    let top = y.round() as i64 - GLYPH_HEIGHT * scale;
    let mut pen_x = x.round() as i64;
    let (w, h) = (image.width() as i64, image.height() as i64);

    for ch in text.chars().flat_map(|c| c.to_uppercase()) {
        let glyph = glyph_bits(ch).or_else(|| glyph_bits('?')).unwrap_or([0; 7]);
        for (row, pattern) in glyph.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if (pattern >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = pen_x + col * scale + dx;
                        let py = top + row as i64 * scale + dy;
                        if px >= 0 && px < w && py >= 0 && py < h {
                            image.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
        pen_x += ADVANCE * scale;
    }
}

fn glyph_bits(ch: char) -> Option<[u8; 7]> {
    let bits = match ch {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b01110, 0b00001, 0b00001, 0b10001, 0b01110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '.' => [0, 0, 0, 0, 0, 0b00110, 0b00110],
        ',' => [0, 0, 0, 0, 0b00110, 0b00100, 0b01000],
        ':' => [0, 0b00110, 0b00110, 0, 0b00110, 0b00110, 0],
        '-' => [0, 0, 0, 0b11111, 0, 0, 0],
        '_' => [0, 0, 0, 0, 0, 0, 0b11111],
        '/' => [0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000],
        '%' => [0b10001, 0b10010, 0b00100, 0b01000, 0b10010, 0b10001, 0],
        '?' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0, 0b00100],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0, 0b00100],
        '=' => [0, 0, 0b11111, 0, 0b11111, 0, 0],
        '&' => [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101],
        '#' => [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010],
        '+' => [0, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0],
        ' ' => [0; 7],
        _ => return None,
    };
    Some(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn lit_pixels(image: &RgbImage) -> Vec<(u32, u32)> {
        image
            .enumerate_pixels()
            .filter(|(_, _, p)| **p == WHITE)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[rstest]
    #[case::small(6.0, 1)]
    #[case::face_label(16.0, 2)]
    #[case::text_label(24.0, 3)]
    fn test_scale_for(#[case] size_px: f64, #[case] expected: i64) {
        assert_eq!(scale_for(size_px), expected);
    }

    #[test]
    fn test_text_sits_on_baseline() {
        let mut image = RgbImage::new(40, 20);
        draw_text(&mut image, "I", 0.0, 10.0, 7.0, WHITE);
        let lit = lit_pixels(&image);
        assert!(!lit.is_empty());
        assert_eq!(lit.iter().map(|p| p.1).min(), Some(3));
        assert_eq!(lit.iter().map(|p| p.1).max(), Some(9));
    }

    #[test]
    fn test_lowercase_matches_uppercase() {
        let mut lower = RgbImage::new(40, 20);
        let mut upper = RgbImage::new(40, 20);
        draw_text(&mut lower, "face", 1.0, 12.0, 7.0, WHITE);
        draw_text(&mut upper, "FACE", 1.0, 12.0, 7.0, WHITE);
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_unknown_glyph_renders_question_mark() {
        let mut unknown = RgbImage::new(10, 10);
        let mut question = RgbImage::new(10, 10);
        draw_text(&mut unknown, "@", 0.0, 8.0, 7.0, WHITE);
        draw_text(&mut question, "?", 0.0, 8.0, 7.0, WHITE);
        assert_eq!(unknown, question);
    }

    #[test]
    fn test_clips_outside_image() {
        let mut image = RgbImage::new(8, 8);
        draw_text(&mut image, "WIDE LABEL", -20.0, 2.0, 16.0, WHITE);
        assert!(lit_pixels(&image).len() < 64);
    }
}
