//! Caption layout: line wrapping and box geometry.
//!
//! Each caption entry becomes one background box followed by one text
//! instruction per line, all visible over the entry's window. Layout is a
//! single pass over the entries and the output list is never mutated
//! afterwards.
//!
//! Widths are estimated from character counts (`glyph_width_ratio` of the
//! font size per character) rather than measured glyph metrics.

use voxreel_common::config::CaptionSettings;
use voxreel_project_model::caption::CaptionEntry;
use voxreel_project_model::frame::{AspectClass, FrameGeometry, Rect};
use voxreel_project_model::plan::{DrawInstruction, DrawKind};

/// Pixel geometry of one laid-out caption.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionBlock {
    pub lines: Vec<String>,
    pub box_rect: Rect,
    /// One rectangle per line, top to bottom.
    pub line_rects: Vec<Rect>,
}

/// The caption layout engine.
pub struct CaptionLayout {
    settings: CaptionSettings,
}

impl CaptionLayout {
    pub fn new(settings: CaptionSettings) -> Self {
        Self { settings }
    }

    pub fn with_defaults() -> Self {
        Self::new(CaptionSettings::default())
    }

    pub fn settings(&self) -> &CaptionSettings {
        &self.settings
    }

    /// Produce draw instructions for every entry, in entry order.
    pub fn layout(
        &self,
        entries: &[CaptionEntry],
        frame: &FrameGeometry,
        font_size: f64,
    ) -> Vec<DrawInstruction> {
        let font_size = self.effective_font_size(font_size);
        let mut draws = Vec::with_capacity(entries.len() * 3);

        for entry in entries {
            let lines = self.wrap(&entry.text, font_size);
            if lines.is_empty() {
                tracing::debug!(start = entry.start, "Skipping caption with no text");
                continue;
            }

            let block = self.block_geometry(lines, frame, font_size);
            draws.push(DrawInstruction {
                kind: DrawKind::Box {
                    color: self.settings.box_color.clone(),
                    opacity: self.settings.box_opacity.clamp(0.0, 1.0),
                },
                geometry: block.box_rect,
                visible_from: entry.start,
                visible_to: entry.end,
            });
            for (line, rect) in block.lines.into_iter().zip(block.line_rects) {
                draws.push(DrawInstruction {
                    kind: DrawKind::Text {
                        text: line,
                        font_size,
                        color: self.settings.text_color.clone(),
                    },
                    geometry: rect,
                    visible_from: entry.start,
                    visible_to: entry.end,
                });
            }
        }

        tracing::debug!(
            entries = entries.len(),
            draws = draws.len(),
            font_size,
            "Captions laid out"
        );
        draws
    }

    /// Split caption text into at most two lines.
    ///
    /// Short text (few words or few characters) always stays on one line.
    /// Longer text is packed greedily against the per-line character
    /// budgets; if that needs more than two lines, the words are
    /// rebalanced onto exactly two.
    pub fn wrap(&self, text: &str, font_size: f64) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return vec![];
        }

        let joined = words.join(" ");
        if words.len() < self.settings.single_line_max_words
            || joined.chars().count() < self.settings.single_line_max_chars
        {
            return vec![joined];
        }

        let (first_budget, rest_budget) = self.line_budgets(font_size);
        let lines = greedy_pack(&words, first_budget, rest_budget);
        if lines.len() <= 2 {
            return lines;
        }

        split_in_two(&words, self.settings.first_line_share)
    }

    /// Character budgets for line one and for later lines.
    pub fn line_budgets(&self, font_size: f64) -> (usize, usize) {
        let font_size = self.effective_font_size(font_size);
        let base =
            self.settings.base_chars_per_line * (self.settings.reference_font_size / font_size);
        let second = base.clamp(20.0, 40.0).floor() as usize;
        let first = (base.clamp(20.0, 50.0).floor() as usize).max(second + 5);
        (first, second)
    }

    /// Box and per-line rectangles for already-wrapped lines.
    pub fn block_geometry(
        &self,
        lines: Vec<String>,
        frame: &FrameGeometry,
        font_size: f64,
    ) -> CaptionBlock {
        let s = &self.settings;
        let frame_w = frame.width as f64;
        let frame_h = frame.height as f64;
        let line_count = lines.len().max(1) as f64;
        let spacing = font_size * s.line_spacing_ratio;

        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f64;
        let natural_width = longest * font_size * s.glyph_width_ratio + 2.0 * s.padding_x;
        let box_width = natural_width.clamp(
            s.min_box_width_ratio * frame_w,
            (s.max_box_width_ratio * frame_w).max(s.min_box_width_ratio * frame_w),
        );
        let box_height = line_count * spacing + s.padding_y;

        let anchor = match frame.aspect {
            AspectClass::Landscape => s.landscape_anchor,
            AspectClass::Portrait => s.portrait_anchor,
            AspectClass::Square => s.square_anchor,
        };
        let mut first_center = anchor * frame_h - (line_count - 1.0) * spacing / 2.0;
        let mut box_y = first_center - spacing / 2.0 - s.padding_y / 2.0;

        // Keep the block inside the frame.
        let overflow = box_y + box_height - frame_h;
        if overflow > 0.0 {
            box_y -= overflow;
            first_center -= overflow;
        }
        if box_y < 0.0 {
            first_center -= box_y;
            box_y = 0.0;
        }

        let box_x = (frame_w - box_width) / 2.0;
        let box_rect = Rect::new(box_x, box_y, box_width, box_height);

        let text_x = box_x + s.padding_x;
        let text_width = (box_width - 2.0 * s.padding_x).max(0.0);
        let line_rects = (0..lines.len())
            .map(|i| {
                let top = first_center - spacing / 2.0 + i as f64 * spacing;
                Rect::new(text_x, top, text_width, spacing)
            })
            .collect();

        CaptionBlock {
            lines,
            box_rect,
            line_rects,
        }
    }

    fn effective_font_size(&self, font_size: f64) -> f64 {
        if font_size.is_finite() && font_size > 0.0 {
            font_size
        } else {
            self.settings.font_size
        }
    }
}

/// Lay out captions with default settings.
pub fn layout(
    entries: &[CaptionEntry],
    frame: &FrameGeometry,
    font_size: f64,
) -> Vec<DrawInstruction> {
    CaptionLayout::with_defaults().layout(entries, frame, font_size)
}

fn greedy_pack(words: &[&str], first_budget: usize, rest_budget: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in words {
        let budget = if lines.is_empty() {
            first_budget
        } else {
            rest_budget
        };
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= budget {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Put roughly `share` of the characters on line one, then move words up
/// while line two is the longer line.
fn split_in_two(words: &[&str], share: f64) -> Vec<String> {
    if words.len() < 2 {
        return vec![words.join(" ")];
    }

    let total = words.join(" ").chars().count() as f64;
    let target = total * share;

    let mut split = 1;
    let mut first_len = words[0].chars().count();
    while split < words.len() - 1 {
        let next_len = first_len + 1 + words[split].chars().count();
        if next_len as f64 > target {
            break;
        }
        first_len = next_len;
        split += 1;
    }

    let line_len = |ws: &[&str]| ws.join(" ").chars().count();
    while words.len() - split > 1 && line_len(&words[split..]) > line_len(&words[..split]) {
        split += 1;
    }

    vec![words[..split].join(" "), words[split..].join(" ")]
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: &str = "the quick brown fox jumps over the lazy dog while the cat watches \
                        from the warm windowsill and the birds sing outside in the garden";

    #[test]
    fn test_short_text_stays_on_one_line() {
        let layout = CaptionLayout::with_defaults();
        assert_eq!(layout.wrap("Hello world", 48.0), vec!["Hello world"]);
        // Four words, but under the character threshold.
        assert_eq!(layout.wrap("one two three four", 48.0).len(), 1);
        // Many characters, but fewer than four words.
        assert_eq!(
            layout.wrap("extraordinarily lengthy vocabulary", 48.0).len(),
            1
        );
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let layout = CaptionLayout::with_defaults();
        assert_eq!(layout.wrap("  Hello \n  world ", 48.0), vec!["Hello world"]);
        assert!(layout.wrap("   ", 48.0).is_empty());
    }

    #[test]
    fn test_budgets_at_reference_size() {
        let layout = CaptionLayout::with_defaults();
        assert_eq!(layout.line_budgets(48.0), (37, 32));
    }

    #[test]
    fn test_budgets_are_clamped() {
        let layout = CaptionLayout::with_defaults();
        // Huge font: base shrinks below 20.
        assert_eq!(layout.line_budgets(200.0), (25, 20));
        // Tiny font: base grows past both caps.
        assert_eq!(layout.line_budgets(10.0), (50, 40));
    }

    #[test]
    fn test_medium_text_wraps_to_two_lines() {
        let layout = CaptionLayout::with_defaults();
        let lines = layout.wrap("this caption is long enough that it needs two lines", 48.0);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].chars().count() <= 37);
    }

    #[test]
    fn test_long_text_is_forced_to_two_lines() {
        let layout = CaptionLayout::with_defaults();
        let lines = layout.wrap(LONG, 48.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.join(" "), LONG.split_whitespace().collect::<Vec<_>>().join(" "));
        assert!(lines[0].chars().count() >= lines[1].chars().count());
    }

    #[test]
    fn test_split_in_two_keeps_a_word_on_each_line() {
        let lines = split_in_two(&["a", "b"], 0.6);
        assert_eq!(lines, vec!["a", "b"]);

        let lines = split_in_two(&["supercalifragilistic", "x", "y"], 0.6);
        assert_eq!(lines.len(), 2);
        assert!(!lines[1].is_empty());
    }

    #[test]
    fn test_single_line_geometry_landscape() {
        let layout = CaptionLayout::with_defaults();
        let frame = FrameGeometry::landscape_hd();
        let block = layout.block_geometry(vec!["Hello world".to_string()], &frame, 48.0);

        // 11 chars * 48 * 0.55 + 48 = 338.4, above the 288px minimum.
        assert!((block.box_rect.width - 338.4).abs() < 1e-9);
        assert!((block.box_rect.height - (48.0 * 1.3 + 20.0)).abs() < 1e-9);
        assert!((block.box_rect.center_x() - 960.0).abs() < 1e-9);

        let line = block.line_rects[0];
        assert!((line.center_y() - 0.85 * 1080.0).abs() < 1e-9);
        assert!((line.x - (block.box_rect.x + 24.0)).abs() < 1e-9);
    }

    #[test]
    fn test_box_width_clamped_to_frame_fraction() {
        let layout = CaptionLayout::with_defaults();
        let frame = FrameGeometry::landscape_hd();

        let narrow = layout.block_geometry(vec!["Hi".to_string()], &frame, 48.0);
        assert!((narrow.box_rect.width - 0.15 * 1920.0).abs() < 1e-9);

        let wide = layout.block_geometry(vec!["x".repeat(120)], &frame, 48.0);
        assert!((wide.box_rect.width - 0.8 * 1920.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_lines_shift_up_by_half_spacing() {
        let layout = CaptionLayout::with_defaults();
        let frame = FrameGeometry::portrait_hd();
        let block = layout.block_geometry(
            vec!["first line".to_string(), "second line".to_string()],
            &frame,
            48.0,
        );
        let spacing = 48.0 * 1.3;
        let expected_first = 0.78 * 1920.0 - spacing / 2.0;
        assert!((block.line_rects[0].center_y() - expected_first).abs() < 1e-9);
        assert!((block.line_rects[1].y - block.line_rects[0].bottom()).abs() < 1e-9);
    }

    #[test]
    fn test_square_frame_uses_square_anchor() {
        let layout = CaptionLayout::with_defaults();
        let frame = FrameGeometry::new(1080, 1080);
        let block = layout.block_geometry(vec!["Done".to_string()], &frame, 48.0);
        assert!((block.line_rects[0].center_y() - 0.82 * 1080.0).abs() < 1e-9);
    }

    #[test]
    fn test_block_stays_inside_small_frame() {
        let layout = CaptionLayout::with_defaults();
        let frame = FrameGeometry::new(640, 240);
        let block = layout.block_geometry(
            vec!["first line".to_string(), "second line".to_string()],
            &frame,
            48.0,
        );
        assert!(block.box_rect.y >= 0.0);
        assert!(block.box_rect.bottom() <= 240.0 + 1e-9);
    }

    #[test]
    fn test_layout_emits_box_then_lines_with_entry_visibility() {
        let entries = vec![
            CaptionEntry::new("Hello world", 0.0, 4.0),
            CaptionEntry::new("this caption is long enough that it needs two lines", 5.0, 8.0),
        ];
        let draws = layout(&entries, &FrameGeometry::landscape_hd(), 48.0);

        assert_eq!(draws.len(), 5);
        assert!(draws[0].is_box());
        assert_eq!(draws[1].text(), Some("Hello world"));
        assert!(draws[2].is_box());
        assert!(draws[3].text().is_some() && draws[4].text().is_some());

        for draw in &draws[..2] {
            assert_eq!((draw.visible_from, draw.visible_to), (0.0, 4.0));
        }
        for draw in &draws[2..] {
            assert_eq!((draw.visible_from, draw.visible_to), (5.0, 8.0));
        }
    }

    #[test]
    fn test_invalid_font_size_falls_back_to_default() {
        let draws = layout(
            &[CaptionEntry::new("Done", 8.0, 10.0)],
            &FrameGeometry::landscape_hd(),
            0.0,
        );
        match &draws[1].kind {
            DrawKind::Text { font_size, .. } => assert_eq!(*font_size, 48.0),
            other => panic!("expected text, got {other:?}"),
        }
    }
}
