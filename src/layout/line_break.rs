//! Greedy line breaking for headless measurement

use crate::layout::font::FontMetrics;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// One laid out line
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpan {
    /// Byte range within the text
    pub byte_range: Range<usize>,
    /// Advance of the line's content, including trailing whitespace
    pub width: f32,
}

/// Line breaker
#[derive(Debug, Default, Clone, Copy)]
pub struct LineBreaker;

impl LineBreaker {
    pub fn new() -> Self {
        Self
    }

    /// Break `text` into lines no wider than `max_width`.
    ///
    /// Lines wrap after whitespace; a run without whitespace that does not fit
    /// is broken at the grapheme that overflows. Whitespace hangs past the edge
    /// and `\n` forces a break. Empty text still produces one line.
    pub fn break_lines(&self, text: &str, max_width: f32, metrics: &FontMetrics) -> Vec<LineSpan> {
        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut x: f32 = 0.0;
        let mut last_break: Option<(usize, f32)> = None;
        let mut has_content = false;

        for (byte_idx, grapheme) in text.grapheme_indices(true) {
            // Check for explicit line break
            if grapheme == "\n" {
                lines.push(LineSpan {
                    byte_range: line_start..byte_idx,
                    width: x,
                });
                line_start = byte_idx + grapheme.len();
                x = 0.0;
                last_break = None;
                has_content = false;
                continue;
            }

            let width = metrics.grapheme_width(grapheme);
            let is_space = grapheme.chars().all(char::is_whitespace);

            // Check for soft wrap
            if !is_space && has_content && x + width > max_width {
                let (break_offset, break_x) = last_break.unwrap_or((byte_idx, x));
                lines.push(LineSpan {
                    byte_range: line_start..break_offset,
                    width: break_x,
                });
                line_start = break_offset;
                x -= break_x;
                last_break = None;
            }

            if is_space {
                last_break = Some((byte_idx + grapheme.len(), x + width));
            }
            x += width;
            has_content = true;
        }

        lines.push(LineSpan {
            byte_range: line_start..text.len(),
            width: x,
        });
        lines
    }

    /// Width of the widest line when nothing wraps
    pub fn natural_width(&self, text: &str, metrics: &FontMetrics) -> f32 {
        text.split('\n')
            .map(|line| {
                line.graphemes(true)
                    .map(|g| metrics.grapheme_width(g))
                    .sum::<f32>()
            })
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> FontMetrics {
        FontMetrics::uniform(10.0, 8.0)
    }

    #[test]
    fn test_empty_text() {
        let lines = LineBreaker::new().break_lines("", 100.0, &metrics());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].byte_range, 0..0);
    }

    #[test]
    fn test_single_line() {
        let lines = LineBreaker::new().break_lines("Hello", 100.0, &metrics());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].width, 40.0);
    }

    #[test]
    fn test_line_wrap() {
        // With 8px per char, 40px width = 5 chars per line
        let lines = LineBreaker::new().break_lines("Hello World", 40.0, &metrics());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].byte_range, 0..6);
        assert_eq!(lines[1].byte_range, 6..11);
    }

    #[test]
    fn test_exact_fit_with_hanging_space() {
        // ten 4-letter words plus spaces fill exactly 400px
        let text = vec!["abcd"; 20].join(" ");
        let lines = LineBreaker::new().break_lines(&text, 400.0, &metrics());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].byte_range, 0..50);
    }

    #[test]
    fn test_emergency_break() {
        let lines = LineBreaker::new().break_lines("abcdefghij", 40.0, &metrics());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].byte_range, 0..5);
    }

    #[test]
    fn test_explicit_newline() {
        let lines = LineBreaker::new().break_lines("Hello\nWorld", 1000.0, &metrics());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].byte_range, 0..5);
        assert_eq!(lines[1].byte_range, 6..11);
    }

    #[test]
    fn test_natural_width() {
        let breaker = LineBreaker::new();
        assert_eq!(breaker.natural_width("ab\nabcd", &metrics()), 32.0);
    }
}
