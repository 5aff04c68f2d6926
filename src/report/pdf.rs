//! Paginated PDF report.
//!
//! Rendering happens in two steps: [`layout_pdf`] flows the session text into
//! pages of positioned lines, then the layout is encoded with `printpdf` using
//! the built-in Helvetica faces.

use super::REPORT_TITLE;
use crate::error::ReportError;
use crate::models::ResearchSession;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use tracing::debug;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
/// Content may not extend below this distance from the bottom edge.
const PAGE_BREAK_MARGIN_MM: f32 = 15.0;
const LINE_HEIGHT_MM: f32 = 10.0;
const PT_TO_MM: f32 = 0.3528;
const USABLE_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

/// Helvetica advance widths for ASCII 32..=126, in thousandths of an em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Upper bound used for characters outside the ASCII tables.
const WIDE_GLYPH: u16 = 1000;

/// Characters the WinAnsi encoding adds on top of Latin-1.
const CP1252_EXTRAS: &str = "\u{20AC}\u{201A}\u{0192}\u{201E}\u{2026}\u{2020}\u{2021}\u{02C6}\u{2030}\u{0160}\u{2039}\u{0152}\u{017D}\u{2018}\u{2019}\u{201C}\u{201D}\u{2022}\u{2013}\u{2014}\u{02DC}\u{2122}\u{0161}\u{203A}\u{0153}\u{017E}\u{0178}";

const TITLE_PT: f32 = 16.0;
const HEADING_PT: f32 = 14.0;
const BODY_PT: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// One line of text, positioned from the top-left corner of its page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub weight: FontWeight,
    pub size_pt: f32,
    pub x_mm: f32,
    pub top_mm: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfPage {
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub pages: Vec<PdfPage>,
}

impl PdfLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.pages.iter().flat_map(|page| page.lines.iter())
    }
}

struct Cursor {
    pages: Vec<PdfPage>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![PdfPage::default()],
            y: MARGIN_MM,
        }
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT_MM - PAGE_BREAK_MARGIN_MM {
            self.pages.push(PdfPage::default());
            self.y = MARGIN_MM;
        }
    }

    fn cell(&mut self, text: String, weight: FontWeight, size_pt: f32) {
        self.ensure_room(LINE_HEIGHT_MM);
        let top_mm = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(TextLine {
                text,
                weight,
                size_pt,
                x_mm: MARGIN_MM,
                top_mm,
            });
        }
        self.y += LINE_HEIGHT_MM;
    }

    fn paragraph(&mut self, text: &str, weight: FontWeight, size_pt: f32) {
        let fits = |line: &str| text_width_mm(line, weight, size_pt) <= USABLE_WIDTH_MM;
        for line in wrap(&sanitize(text), fits) {
            self.cell(line, weight, size_pt);
        }
    }

    fn gap(&mut self, height: f32) {
        self.y += height;
    }

    fn finish(self) -> PdfLayout {
        PdfLayout { pages: self.pages }
    }
}

/// Flows the report into pages.
pub fn layout_pdf(session: &ResearchSession) -> PdfLayout {
    let mut cursor = Cursor::new();

    cursor.cell(REPORT_TITLE.to_string(), FontWeight::Bold, TITLE_PT);
    cursor.gap(10.0);
    cursor.paragraph(&format!("Topic: {}", session.topic), FontWeight::Regular, BODY_PT);
    cursor.gap(5.0);

    cursor.cell("Summary".to_string(), FontWeight::Bold, HEADING_PT);
    cursor.paragraph(&session.summary, FontWeight::Regular, BODY_PT);
    cursor.gap(5.0);

    if !session.followups.is_empty() {
        cursor.cell("Follow-Up Q&A".to_string(), FontWeight::Bold, HEADING_PT);
        for item in &session.followups {
            cursor.paragraph(&format!("Q: {}", item.question), FontWeight::Regular, BODY_PT);
            cursor.paragraph(&format!("A: {}", item.answer), FontWeight::Regular, BODY_PT);
            cursor.gap(3.0);
        }
    }

    cursor.finish()
}

pub fn to_pdf(session: &ResearchSession) -> Result<Vec<u8>, ReportError> {
    let layout = layout_pdf(session);
    debug!(
        pages = layout.page_count(),
        lines = layout.lines().count(),
        "Laid out PDF report"
    );
    encode(&layout)
}

fn encode(layout: &PdfLayout) -> Result<Vec<u8>, ReportError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        REPORT_TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;

    for (index, page) in layout.pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for line in page.lines.iter().filter(|l| !l.text.is_empty()) {
            let font = match line.weight {
                FontWeight::Regular => &regular,
                FontWeight::Bold => &bold,
            };
            // PDF user space grows upwards from the bottom edge.
            let baseline = line.top_mm + LINE_HEIGHT_MM / 2.0 + line.size_pt * PT_TO_MM * 0.35;
            layer.use_text(
                line.text.as_str(),
                line.size_pt,
                Mm(line.x_mm),
                Mm(PAGE_HEIGHT_MM - baseline),
                font,
            );
        }
    }

    doc.save_to_bytes().map_err(|e| ReportError::Pdf(e.to_string()))
}

fn glyph_width(c: char, weight: FontWeight) -> u16 {
    let table = match weight {
        FontWeight::Regular => &HELVETICA_WIDTHS,
        FontWeight::Bold => &HELVETICA_BOLD_WIDTHS,
    };
    match c {
        ' '..='~' => table[c as usize - 32],
        _ => WIDE_GLYPH,
    }
}

/// Rendered width of `text` set in Helvetica at `size_pt`.
fn text_width_mm(text: &str, weight: FontWeight, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(c, weight))).sum();
    units as f32 / 1000.0 * size_pt * PT_TO_MM
}

fn is_win_ansi(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{00A1}'..='\u{00FF}') || CP1252_EXTRAS.contains(c)
}

/// Maps text onto the WinAnsi repertoire of the built-in fonts.
fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push('\n'),
            '\r' => {}
            '\u{00A0}' | '\t' => out.push(' '),
            c if is_win_ansi(c) => out.push(c),
            '\u{201B}' | '\u{2032}' => out.push('\''),
            '\u{201F}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2012}' | '\u{2015}' | '\u{2212}' => out.push('-'),
            _ => out.push('?'),
        }
    }
    out
}

/// Greedy word wrap. Explicit newlines are kept; words wider than a line are split.
fn wrap(text: &str, fits: impl Fn(&str) -> bool) -> Vec<String> {
    let mut lines = Vec::new();

    for raw in text.split('\n') {
        let mut current = String::new();
        for word in raw.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut rest = word;
            while !fits(rest) {
                let split = split_point(rest, &fits);
                lines.push(rest[..split].to_string());
                rest = &rest[split..];
            }
            current = rest.to_string();
        }
        lines.push(current);
    }

    lines
}

/// Byte index of the longest prefix that fits, never less than one character.
fn split_point(word: &str, fits: &impl Fn(&str) -> bool) -> usize {
    let mut split = word.chars().next().map_or(word.len(), char::len_utf8);
    for (i, c) in word.char_indices().skip(1) {
        let end = i + c.len_utf8();
        if !fits(&word[..end]) {
            break;
        }
        split = end;
    }
    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FollowUp;

    fn session(summary: &str, followups: Vec<FollowUp>) -> ResearchSession {
        ResearchSession {
            topic: "quantum computing".to_string(),
            summary: summary.to_string(),
            followups,
        }
    }

    fn texts(layout: &PdfLayout) -> Vec<&str> {
        layout.lines().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_layout_orders_sections() {
        let layout = layout_pdf(&session(
            "Quantum computers use qubits...",
            vec![FollowUp::new("What is a qubit?", "A qubit is...")],
        ));
        assert_eq!(
            texts(&layout),
            vec![
                "AI Research Report",
                "Topic: quantum computing",
                "Summary",
                "Quantum computers use qubits...",
                "Follow-Up Q&A",
                "Q: What is a qubit?",
                "A: A qubit is...",
            ]
        );
        assert_eq!(layout.page_count(), 1);
    }

    #[test]
    fn test_layout_without_followups_omits_heading() {
        let layout = layout_pdf(&session("Short summary.", vec![]));
        assert!(!texts(&layout).contains(&"Follow-Up Q&A"));
    }

    #[test]
    fn test_headings_are_bold() {
        let layout = layout_pdf(&session("Body", vec![]));
        let summary = layout.lines().find(|l| l.text == "Summary").unwrap();
        assert_eq!(summary.weight, FontWeight::Bold);
        assert_eq!(summary.size_pt, HEADING_PT);
        let body = layout.lines().find(|l| l.text == "Body").unwrap();
        assert_eq!(body.weight, FontWeight::Regular);
    }

    #[test]
    fn test_long_summary_flows_across_pages() {
        let summary = "qubits entangle and interfere ".repeat(800);
        let layout = layout_pdf(&session(&summary, vec![FollowUp::new("q", "a")]));

        assert!(layout.page_count() > 2);
        for page in &layout.pages {
            assert!(!page.lines.is_empty());
            for line in &page.lines {
                assert!(line.top_mm >= MARGIN_MM);
                assert!(line.top_mm + LINE_HEIGHT_MM <= PAGE_HEIGHT_MM - PAGE_BREAK_MARGIN_MM);
                assert!(text_width_mm(&line.text, line.weight, line.size_pt) <= USABLE_WIDTH_MM);
            }
        }
        assert_eq!(texts(&layout).last(), Some(&"A: a"));
    }

    #[test]
    fn test_pdf_bytes_have_header_and_grow_with_pages() {
        let short = to_pdf(&session("Short.", vec![])).unwrap();
        let long = to_pdf(&session(&"word ".repeat(5000), vec![])).unwrap();
        assert!(short.starts_with(b"%PDF"));
        assert!(long.len() > short.len());
    }

    #[test]
    fn test_wide_glyphs_wrap_sooner_than_narrow_ones() {
        let wide = layout_pdf(&session(&"WWWW MMMM ".repeat(60), vec![]));
        let narrow = layout_pdf(&session(&"iiii llll ".repeat(60), vec![]));

        let widest = |layout: &PdfLayout| {
            layout
                .lines()
                .filter(|l| l.weight == FontWeight::Regular)
                .map(|l| l.text.chars().count())
                .max()
                .unwrap()
        };
        assert!(widest(&wide) < widest(&narrow));
        for line in wide.lines() {
            assert!(text_width_mm(&line.text, line.weight, line.size_pt) <= USABLE_WIDTH_MM);
        }
    }

    #[test]
    fn test_text_width_uses_weight_tables() {
        assert!(text_width_mm("W", FontWeight::Regular, BODY_PT) > text_width_mm("i", FontWeight::Regular, BODY_PT));
        assert!(text_width_mm("bold", FontWeight::Bold, BODY_PT) > text_width_mm("bold", FontWeight::Regular, BODY_PT));
        assert_eq!(text_width_mm("", FontWeight::Regular, BODY_PT), 0.0);
    }

    fn char_fit(width: usize) -> impl Fn(&str) -> bool {
        move |line: &str| line.chars().count() <= width
    }

    #[test]
    fn test_wrap_respects_width_and_newlines() {
        let lines = wrap("alpha beta gamma\ndelta", char_fit(11));
        assert_eq!(lines, vec!["alpha beta", "gamma", "delta"]);
    }

    #[test]
    fn test_wrap_splits_overlong_words() {
        let lines = wrap("abcdefghij xy", char_fit(4));
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn test_wrap_keeps_blank_lines() {
        assert_eq!(wrap("", char_fit(10)), vec![""]);
        assert_eq!(wrap("a\n\nb", char_fit(10)), vec!["a", "", "b"]);
    }

    #[test]
    fn test_sanitize_keeps_win_ansi_text() {
        assert_eq!(sanitize("Schr\u{f6}dinger caf\u{e9} a\u{f1}o \u{fc}ber\r\n"), "Schr\u{f6}dinger caf\u{e9} a\u{f1}o \u{fc}ber\n");
        assert_eq!(
            sanitize("\u{201C}qubit\u{201D} \u{2014} it\u{2019}s\u{2026} 5\u{20AC}"),
            "\u{201C}qubit\u{201D} \u{2014} it\u{2019}s\u{2026} 5\u{20AC}"
        );
    }

    #[test]
    fn test_sanitize_replaces_text_outside_win_ansi() {
        assert_eq!(sanitize("x \u{2212} y\u{2032}"), "x - y'");
        assert_eq!(sanitize("\u{91cf}\u{5b50} \u{3c8}"), "?? ?");
    }

    #[test]
    fn test_layout_keeps_accented_topic() {
        let mut report = session("Summary", vec![]);
        report.topic = "Schr\u{f6}dinger".to_string();
        assert!(texts(&layout_pdf(&report)).contains(&"Topic: Schr\u{f6}dinger"));
    }
}
