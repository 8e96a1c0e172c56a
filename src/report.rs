use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Local;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::models::{PageContent, SummaryResult};

pub const DEFAULT_REPORT_NAME: &str = "Prospect_Report.pdf";

const NO_TITLE: &str = "No title found";
const NO_DESCRIPTION: &str = "No meta description found";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const FOOTER_Y: f32 = 10.0;
const BOTTOM_LIMIT: f32 = 25.0;
const PT_TO_MM: f32 = 0.352_778;
const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Advance widths (1/1000 em) for ASCII 32..=126, the wider of Helvetica and
/// Helvetica-Bold for each glyph, so one table covers every style in use.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    1015, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];
/// Latin-1 glyphs outside ASCII are measured as a full em.
const FALLBACK_WIDTH: u16 = 1000;

const SEPARATORS: &[&str] = &[" | ", " - ", " – ", " — ", " : "];

/// Company name guessed from a page title: the part before the first
/// separator such as `" | "`.
pub fn company_name(title: &str) -> &str {
    SEPARATORS
        .iter()
        .filter_map(|sep| title.find(sep))
        .min()
        .map(|idx| &title[..idx])
        .unwrap_or(title)
        .trim()
}

pub fn report_file_name(title: &str, configured: Option<&str>) -> String {
    if let Some(name) = configured.and_then(|n| Path::new(n).file_name()).and_then(|n| n.to_str()) {
        return if name.to_ascii_lowercase().ends_with(".pdf") {
            name.to_string()
        } else {
            format!("{}.pdf", name)
        };
    }

    let mut slug = String::new();
    for c in company_name(title).chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');

    if slug.is_empty() {
        DEFAULT_REPORT_NAME.to_string()
    } else {
        format!("{}_{}", slug, DEFAULT_REPORT_NAME)
    }
}

/// Renders the report and writes it under the configured directory.
pub fn write_report(page: &PageContent, summary: &SummaryResult, config: &Config) -> Result<PathBuf> {
    fs::create_dir_all(&config.report_dir)?;
    let path = config
        .report_dir
        .join(report_file_name(&page.title, config.report_file_name.as_deref()));

    let doc = render(page, summary)?;
    let mut writer = BufWriter::new(File::create(&path)?);
    doc.save(&mut writer)?;

    info!(path = %path.display(), "Report written");
    Ok(path)
}

fn render(page: &PageContent, summary: &SummaryResult) -> Result<PdfDocumentReference> {
    let title = or_placeholder(&page.title, NO_TITLE);
    let description = or_placeholder(&page.description, NO_DESCRIPTION);

    let (doc, page_index, layer_index) =
        PdfDocument::new(format!("Prospect Report: {}", title), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
        italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique)?,
    };
    let layer = doc.get_page(page_index).get_layer(layer_index);

    let mut layout = Layout {
        doc,
        fonts,
        layer,
        y: PAGE_HEIGHT - MARGIN,
        page_no: 1,
    };

    layout.centered(&format!("Prospect Report: {}", title), 16.0, FontStyle::Bold, 10.0);
    layout.paragraph(&page.url, 9.0, FontStyle::Italic, 5.0);
    layout.paragraph(
        &format!("Generated {}", Local::now().format("%Y-%m-%d %H:%M")),
        9.0,
        FontStyle::Italic,
        5.0,
    );
    layout.gap(5.0);

    layout.paragraph("Website Description:", 12.0, FontStyle::Italic, 8.0);
    layout.paragraph(description, 12.0, FontStyle::Regular, 6.0);
    layout.gap(5.0);

    layout.paragraph("Summarized Content:", 12.0, FontStyle::Italic, 8.0);
    layout.paragraph(&summary.summary_text, 12.0, FontStyle::Regular, 6.0);

    layout.footer();
    Ok(layout.doc)
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() { placeholder } else { value }
}

#[derive(Clone, Copy)]
enum FontStyle {
    Regular,
    Bold,
    Italic,
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

/// Top-down text cursor that starts a new page when the current one fills up.
struct Layout {
    doc: PdfDocumentReference,
    fonts: Fonts,
    layer: PdfLayerReference,
    y: f32,
    page_no: usize,
}

impl Layout {
    fn font(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.fonts.regular,
            FontStyle::Bold => &self.fonts.bold,
            FontStyle::Italic => &self.fonts.italic,
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn ensure_room(&mut self, line_height: f32) {
        if self.y - line_height >= BOTTOM_LIMIT {
            return;
        }
        self.footer();
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.page_no += 1;
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn paragraph(&mut self, text: &str, size: f32, style: FontStyle, line_height: f32) {
        for line in wrap_to_width(&pdf_safe(text), size, TEXT_WIDTH) {
            self.ensure_room(line_height);
            self.y -= line_height;
            self.layer.use_text(line, size, Mm(MARGIN), Mm(self.y), self.font(style));
        }
    }

    fn centered(&mut self, text: &str, size: f32, style: FontStyle, line_height: f32) {
        for line in wrap_to_width(&pdf_safe(text), size, TEXT_WIDTH) {
            self.ensure_room(line_height);
            self.y -= line_height;
            let x = ((PAGE_WIDTH - text_width(&line, size)) / 2.0).max(MARGIN);
            self.layer.use_text(line, size, Mm(x), Mm(self.y), self.font(style));
        }
    }

    fn footer(&self) {
        let label = format!("Page {}", self.page_no);
        let x = (PAGE_WIDTH - text_width(&label, 8.0)) / 2.0;
        self.layer.use_text(label, 8.0, Mm(x), Mm(FOOTER_Y), &self.fonts.italic);
    }
}

fn glyph_width(c: char) -> u16 {
    match c as u32 {
        code @ 32..=126 => HELVETICA_WIDTHS[(code - 32) as usize],
        _ => FALLBACK_WIDTH,
    }
}

/// Rendered width in millimetres of `text` at `size` points.
fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| glyph_width(c) as u32).sum();
    units as f32 / 1000.0 * size * PT_TO_MM
}

/// Greedy word wrap by measured width; words wider than a line are cut
/// between characters.
fn wrap_to_width(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            current.push(c);
            if text_width(&current, size) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::replace(&mut current, c.to_string()));
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Built-in PDF fonts only cover Latin-1, so typographic punctuation is
/// folded to ASCII and anything else outside the range becomes `?`.
pub fn pdf_safe(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' => Some('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' => Some('"'),
            '\u{2013}' | '\u{2014}' => Some('-'),
            '\u{2026}' => Some('.'),
            '\u{00A0}' => Some(' '),
            c if c.is_control() => (c == '\t' || c == '\n').then_some(' '),
            c if (c as u32) <= 0xFF => Some(c),
            _ => Some('?'),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> PageContent {
        PageContent {
            url: "https://acme.test/".to_string(),
            title: "Acme Corp".to_string(),
            description: "We make widgets.".to_string(),
            body_text: "Acme Corp has been building widgets since 1990...".to_string(),
        }
    }

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.report_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn company_name_stops_at_separator() {
        assert_eq!(company_name("Viso Suite | Computer Vision Platform"), "Viso Suite");
        assert_eq!(company_name("Acme - Widgets : Home"), "Acme");
        assert_eq!(company_name("Plain Title"), "Plain Title");
    }

    #[test]
    fn file_name_is_derived_from_company() {
        assert_eq!(report_file_name("Acme Corp", None), "Acme_Corp_Prospect_Report.pdf");
        assert_eq!(report_file_name("  Fünf & Co. | Home", None), "F_nf_Co_Prospect_Report.pdf");
    }

    #[test]
    fn file_name_falls_back_to_default() {
        assert_eq!(report_file_name("", None), DEFAULT_REPORT_NAME);
        assert_eq!(report_file_name("日本語", None), DEFAULT_REPORT_NAME);
    }

    #[test]
    fn configured_file_name_wins() {
        assert_eq!(report_file_name("Acme", Some("custom")), "custom.pdf");
        assert_eq!(report_file_name("Acme", Some("../escape/Report.PDF")), "Report.PDF");
    }

    #[test]
    fn pdf_safe_folds_typography() {
        assert_eq!(pdf_safe("It\u{2019}s \u{201C}great\u{201D} \u{2014} caf\u{e9}"), "It's \"great\" - caf\u{e9}");
        assert_eq!(pdf_safe("日本"), "??");
    }

    #[test]
    fn wide_capitals_wrap_inside_the_page() {
        let text = "WIDE MEMBERSHIP WWW ".repeat(30);
        let lines = wrap_to_width(&text, 12.0, TEXT_WIDTH);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 12.0) <= TEXT_WIDTH, "line too wide: {}", line);
        }
        // 'W' is 0.944 em, so fewer than 45 of them fit on a 12pt line.
        let ws = wrap_to_width(&"W".repeat(200), 12.0, TEXT_WIDTH);
        assert!(ws.iter().all(|line| line.chars().count() < 45));
        assert_eq!(ws.concat(), "W".repeat(200));
    }

    #[test]
    fn narrow_text_fits_more_per_line_than_capitals() {
        let lower = wrap_to_width(&"ill ".repeat(100), 12.0, TEXT_WIDTH);
        let upper = wrap_to_width(&"MMM ".repeat(100), 12.0, TEXT_WIDTH);
        assert!(lower.len() < upper.len());
    }

    #[test]
    fn writes_pdf_with_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        let summary = SummaryResult {
            summary_text: "Acme builds widgets.".to_string(),
            chunk_count: 1,
        };

        let path = write_report(&sample_page(), &summary, &config_in(dir.path())).unwrap();
        assert_eq!(path, dir.path().join("Acme_Corp_Prospect_Report.pdf"));

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let doc = lopdf::Document::load(&path).unwrap();
        let text = doc.extract_text(&[1]).unwrap();
        assert!(text.contains("Acme Corp"));
        assert!(text.contains("We make widgets."));
        assert!(text.contains("Acme builds widgets."));
    }

    #[test]
    fn long_summary_flows_onto_more_pages() {
        let dir = tempfile::tempdir().unwrap();
        let summary = SummaryResult {
            summary_text: "Widgets are sturdy and affordable. ".repeat(400),
            chunk_count: 20,
        };

        let path = write_report(&sample_page(), &summary, &config_in(dir.path())).unwrap();
        let doc = lopdf::Document::load(&path).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports").join("2026");
        let summary = SummaryResult { summary_text: String::new(), chunk_count: 0 };

        let path = write_report(&sample_page(), &summary, &config_in(&nested)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unwritable_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();
        let summary = SummaryResult { summary_text: "x".into(), chunk_count: 1 };

        let err = write_report(&sample_page(), &summary, &config_in(&blocker)).unwrap_err();
        assert!(matches!(err, crate::error::AppError::IoError(_)));
    }
}
