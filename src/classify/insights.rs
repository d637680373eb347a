//! Document-wide typography insights.
//!
//! Body text is assumed to be the most common font and the most common size
//! of at least 11pt. Everything else about classification is measured
//! relative to these two values.

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{Line, SizeKey};

/// Sizes below this are never considered body text.
pub const MIN_TEXT_SIZE: f32 = 11.0;

/// Font and size frequencies across a whole document.
///
/// Both tables keep first-seen order; ties are always resolved in favour of
/// the entry seen first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypographyStats {
    /// Font name occurrences
    pub fonts: IndexMap<String, u32>,
    /// Font size occurrences keyed by 0.1pt size
    pub sizes: IndexMap<SizeKey, u32>,
}

impl TypographyStats {
    /// Sum the per-line statistics of every line.
    pub fn collect(lines: &[Line]) -> Self {
        let mut stats = Self::default();
        for line in lines {
            for (size, count) in &line.size_stats {
                *stats.sizes.entry(*size).or_insert(0) += count;
            }
            for (font, count) in &line.style_stats {
                *stats.fonts.entry(font.clone()).or_insert(0) += count;
            }
        }
        stats
    }

    /// Fonts that can be body or heading text, with their counts.
    ///
    /// Symbol fonts and italic fonts that are not also bold are dropped.
    pub fn text_fonts(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.fonts
            .iter()
            .filter(|(font, _)| is_text_font(font))
            .map(|(font, count)| (font.as_str(), *count))
    }

    /// Sizes of at least [`MIN_TEXT_SIZE`], with their counts.
    pub fn text_sizes(&self) -> impl Iterator<Item = (SizeKey, u32)> + '_ {
        let min = SizeKey::from_points(MIN_TEXT_SIZE);
        self.sizes
            .iter()
            .filter(move |(size, _)| **size >= min)
            .map(|(size, count)| (*size, *count))
    }
}

fn is_text_font(font: &str) -> bool {
    let lower = font.to_lowercase();
    if lower.contains("symbol") {
        return false;
    }
    !(lower.contains("italic") && !lower.contains("bold"))
}

/// Inferred body and heading typography of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Insights {
    /// Most frequent text font
    pub paragraph_font: Option<String>,

    /// All other text fonts, most frequent first
    pub heading_fonts: Vec<String>,

    /// Most frequent size of at least 11pt
    pub paragraph_size: Option<SizeKey>,

    /// First size larger than the paragraph size, in first-seen order
    pub heading_size: Option<SizeKey>,
}

impl Insights {
    /// Infer insights from a document's lines.
    pub fn from_lines(lines: &[Line]) -> Self {
        Self::from_stats(&TypographyStats::collect(lines))
    }

    /// Infer insights from pre-computed statistics.
    pub fn from_stats(stats: &TypographyStats) -> Self {
        let mut fonts: Vec<(&str, u32)> = stats.text_fonts().collect();
        // Stable sort keeps first-seen order among equal counts.
        fonts.sort_by(|a, b| b.1.cmp(&a.1));

        let mut fonts = fonts.into_iter().map(|(font, _)| font.to_string());
        let paragraph_font = fonts.next();
        let heading_fonts: Vec<String> = fonts.collect();

        if paragraph_font.is_none() {
            log::warn!(
                "No text font found among {} fonts; font signals disabled",
                stats.fonts.len()
            );
        }

        let mut paragraph_size: Option<(SizeKey, u32)> = None;
        for (size, count) in stats.text_sizes() {
            if paragraph_size.map_or(true, |(_, best)| count > best) {
                paragraph_size = Some((size, count));
            }
        }
        let paragraph_size = paragraph_size.map(|(size, _)| size);

        let heading_size = paragraph_size.and_then(|body| {
            stats
                .text_sizes()
                .map(|(size, _)| size)
                .find(|size| *size > body)
        });

        if paragraph_size.is_none() {
            log::warn!(
                "No font size of at least {}pt found; size signals disabled",
                MIN_TEXT_SIZE
            );
        }

        log::debug!(
            "Insights: paragraph font {:?}, paragraph size {:?}, heading size {:?}",
            paragraph_font,
            paragraph_size.map(|s| s.points()),
            heading_size.map(|s| s.points())
        );

        Self {
            paragraph_font,
            heading_fonts,
            paragraph_size,
            heading_size,
        }
    }

    /// Check if any size-based signal is available.
    pub fn has_size_signal(&self) -> bool {
        self.paragraph_size.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(sizes: &[(f32, u32)], fonts: &[(&str, u32)]) -> Line {
        Line::new(
            "text",
            0,
            0,
            0.0,
            sizes.iter().map(|(s, c)| (SizeKey::from_points(*s), *c)).collect(),
            fonts.iter().map(|(f, c)| (f.to_string(), *c)).collect(),
        )
    }

    #[test]
    fn test_body_and_heading_sizes() {
        let mut lines = vec![line(&[(12.0, 5)], &[("Times", 1)]); 50];
        lines.extend(vec![line(&[(16.0, 1)], &[("Times-Bold", 1)]); 5]);

        let insights = Insights::from_lines(&lines);
        assert_eq!(insights.paragraph_size, Some(SizeKey::from_points(12.0)));
        assert_eq!(insights.heading_size, Some(SizeKey::from_points(16.0)));
        assert_eq!(insights.paragraph_font.as_deref(), Some("Times"));
        assert_eq!(insights.heading_fonts, vec!["Times-Bold"]);
    }

    #[test]
    fn test_small_sizes_ignored() {
        let lines = vec![line(&[(9.0, 100), (11.0, 2), (14.0, 1)], &[])];
        let insights = Insights::from_lines(&lines);
        assert_eq!(insights.paragraph_size, Some(SizeKey::from_points(11.0)));
        assert_eq!(insights.heading_size, Some(SizeKey::from_points(14.0)));
    }

    #[test]
    fn test_heading_size_uses_first_seen_order() {
        // 18 is seen before 14, so it wins even though 14 is smaller.
        let lines = vec![line(&[(18.0, 1), (12.0, 10), (14.0, 1)], &[])];
        let insights = Insights::from_lines(&lines);
        assert_eq!(insights.heading_size, Some(SizeKey::from_points(18.0)));
    }

    #[test]
    fn test_ties_go_to_first_seen() {
        let lines = vec![line(&[(13.0, 3), (12.0, 3)], &[("B", 2), ("A", 2)])];
        let insights = Insights::from_lines(&lines);
        assert_eq!(insights.paragraph_size, Some(SizeKey::from_points(13.0)));
        assert_eq!(insights.paragraph_font.as_deref(), Some("B"));
    }

    #[test]
    fn test_decorative_fonts_filtered() {
        let lines = vec![line(
            &[],
            &[
                ("SymbolMT", 50),
                ("Arial-Italic", 40),
                ("Arial-BoldItalic", 3),
                ("Arial", 10),
            ],
        )];
        let insights = Insights::from_lines(&lines);
        assert_eq!(insights.paragraph_font.as_deref(), Some("Arial"));
        assert_eq!(insights.heading_fonts, vec!["Arial-BoldItalic"]);
    }

    #[test]
    fn test_degenerate_document() {
        let lines = vec![line(&[(8.0, 4)], &[("Symbol", 4)])];
        let insights = Insights::from_lines(&lines);
        assert_eq!(insights, Insights::default());
        assert!(!insights.has_size_signal());

        assert_eq!(Insights::from_lines(&[]), Insights::default());
    }

    #[test]
    fn test_sizes_merge_across_lines() {
        let lines = vec![
            line(&[(12.04, 1)], &[("A", 1)]),
            line(&[(11.96, 1)], &[("A", 1)]),
        ];
        let stats = TypographyStats::collect(&lines);
        assert_eq!(stats.sizes.len(), 1);
        assert_eq!(stats.sizes[&SizeKey::from_points(12.0)], 2);
        assert_eq!(stats.fonts["A"], 2);
    }

    #[test]
    fn test_deterministic() {
        let lines = vec![
            line(&[(14.0, 2), (12.0, 2)], &[("X", 1), ("Y", 1)]),
            line(&[(16.0, 1)], &[("Z", 1)]),
        ];
        let first = Insights::from_lines(&lines);
        for _ in 0..10 {
            assert_eq!(Insights::from_lines(&lines), first);
        }
    }
}
