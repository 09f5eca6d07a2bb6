use crate::rubric::{band_for, Band, Criterion, FinalGrade};
use anyhow::anyhow;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use serde::Serialize;
use std::path::Path;

pub const NO_COMMENT_TEXT: &str = "No additional comments.";
const DISCLAIMER: &str = "* This grade is provisional only and may be subject to change.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScore {
    pub criterion: Criterion,
    pub band: Band,
    pub score: u8,
}

/// Snapshot handed to the renderer and to the record store at submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentPayload {
    pub student_id: Option<String>,
    pub student_name: String,
    pub student_surname: String,
    pub course: String,
    pub mode: String,
    pub module_name: String,
    pub report_title: String,
    pub supervisor: String,
    pub assessor_name: String,
    pub assessor_comments: String,
    /// In `Criterion::ALL` order.
    pub scores: Vec<CriterionScore>,
    pub final_grade: FinalGrade,
}

impl AssessmentPayload {
    /// Grade exactly as displayed and persisted.
    pub fn final_grade_text(&self) -> String {
        self.final_grade.to_string()
    }
}

pub trait ReportRenderer {
    fn render(&self, payload: &AssessmentPayload, out_path: &Path) -> anyhow::Result<()>;
}

/// Static text printed around the report body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBranding {
    /// Short mark printed top left.
    pub institution: String,
    /// Right-aligned lines under the module name; the last one is bold.
    pub header_lines: Vec<String>,
    pub title: String,
    pub subtitle_prefix: String,
}

impl Default for ReportBranding {
    fn default() -> Self {
        Self {
            institution: String::new(),
            header_lines: Vec::new(),
            title: "Assessment".to_string(),
            subtitle_prefix: "Report".to_string(),
        }
    }
}

const PAGE_W: f32 = 595.0;
const PAGE_H: f32 = 842.0;
const MARGIN: f32 = 22.0;
const BODY_SIZE: f32 = 10.0;
const MAX_COMMENT_LINES: usize = 18;

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Rough Helvetica advance; good enough for alignment and wrapping.
fn approx_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.52
}

/// Latin-1 bytes for the WinAnsi-encoded base fonts.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();
            if word.is_empty() {
                continue;
            }
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Column of the band table a score is printed in (0 = A+).
pub fn band_column(score: u8) -> usize {
    let band = band_for(score);
    Band::ALL.iter().position(|b| *b == band).unwrap_or(0)
}

struct Canvas {
    ops: Vec<Operation>,
}

impl Canvas {
    fn new() -> Self {
        Self {
            ops: vec![Operation::new("w", vec![0.8f32.into()])],
        }
    }

    /// `top` is measured from the top edge of the page to the baseline.
    fn text(&mut self, font: Font, size: f32, x: f32, top: f32, text: &str) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![font.resource().into(), size.into()],
        ));
        self.ops
            .push(Operation::new("Td", vec![x.into(), (PAGE_H - top).into()]));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi(text), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn text_right(&mut self, font: Font, size: f32, right: f32, top: f32, text: &str) {
        let x = right - approx_width(text, size);
        self.text(font, size, x, top, text);
    }

    fn text_centered(&mut self, font: Font, size: f32, left: f32, width: f32, top: f32, text: &str) {
        let x = left + (width - approx_width(text, size)).max(0.0) / 2.0;
        self.text(font, size, x, top, text);
    }

    fn cell(&mut self, x: f32, top: f32, w: f32, h: f32) {
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), (PAGE_H - top - h).into(), w.into(), h.into()],
        ));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn shade(&mut self, x: f32, top: f32, w: f32, h: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new("g", vec![0.83f32.into()]));
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), (PAGE_H - top - h).into(), w.into(), h.into()],
        ));
        self.ops.push(Operation::new("f", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
    }
}

/// Single-page A4 report written with the standard Helvetica fonts.
#[derive(Debug, Clone, Default)]
pub struct PdfReportRenderer {
    branding: ReportBranding,
}

impl PdfReportRenderer {
    pub fn new(branding: ReportBranding) -> Self {
        Self { branding }
    }

    fn draw(&self, payload: &AssessmentPayload, date: &str) -> Vec<Operation> {
        let mut c = Canvas::new();
        let width = PAGE_W - 2.0 * MARGIN;
        let right = PAGE_W - MARGIN;
        let or = |s: &str, fallback: &str| {
            if s.trim().is_empty() {
                fallback.to_string()
            } else {
                s.trim().to_string()
            }
        };

        // Header block.
        if !self.branding.institution.is_empty() {
            c.text(Font::Bold, 22.0, MARGIN, 58.0, &self.branding.institution);
        }
        let module = or(&payload.module_name, "Module not specified");
        c.text_right(Font::Regular, 12.0, right, 44.0, &format!("Module Name: {module}"));
        let mut top = 62.0;
        let last = self.branding.header_lines.len().saturating_sub(1);
        for (i, line) in self.branding.header_lines.iter().enumerate() {
            if i == last {
                c.text_right(Font::Bold, 14.0, right, top, line);
            } else {
                c.text_right(Font::Regular, 12.0, right, top, line);
            }
            top += 17.0;
        }

        let title_top = top.max(100.0) + 40.0;
        c.text_centered(Font::Bold, 20.0, MARGIN, width, title_top, &self.branding.title);
        let report_title = or(&payload.report_title, "Report title not specified");
        c.text_centered(
            Font::Bold,
            16.0,
            MARGIN,
            width,
            title_top + 28.0,
            &format!("{}: {}", self.branding.subtitle_prefix, report_title),
        );

        // Grade table.
        let label_w = width * 0.40;
        let band_w = (width - label_w) / 7.0;
        let first_h = 36.0;
        let row_h = 28.0;
        let mut y = title_top + 50.0;

        let student = or(
            &format!("{} {}", payload.student_name.trim(), payload.student_surname.trim()),
            "Student name not specified",
        );
        c.cell(MARGIN, y, width, first_h);
        c.text(Font::Regular, 12.0, MARGIN + 6.0, y + 22.0, &format!("Student: {student}"));
        y += first_h;

        c.shade(MARGIN, y, width, row_h * 2.0);
        for (i, band) in Band::ALL.iter().enumerate() {
            let x = MARGIN + label_w + band_w * i as f32;
            let (min, max) = band.range();
            c.cell(x, y, band_w, row_h);
            c.text_centered(Font::Bold, 12.0, x, band_w, y + 18.0, band.letter());
            c.cell(x, y + row_h, band_w, row_h);
            c.text_centered(Font::Regular, 11.0, x, band_w, y + row_h + 18.0, &format!("{min}-{max}"));
        }
        c.cell(MARGIN, y, label_w, row_h);
        c.cell(MARGIN, y + row_h, label_w, row_h);
        y += row_h * 2.0;

        for entry in &payload.scores {
            let label = format!(
                "{} ({}%)",
                entry.criterion.display_name(),
                entry.criterion.weight()
            );
            c.cell(MARGIN, y, label_w, row_h);
            c.text(Font::Regular, BODY_SIZE, MARGIN + 6.0, y + 18.0, &label);
            let col = band_column(entry.score);
            for i in 0..Band::ALL.len() {
                let x = MARGIN + label_w + band_w * i as f32;
                c.cell(x, y, band_w, row_h);
                if i == col {
                    c.text_centered(Font::Bold, 12.0, x, band_w, y + 18.0, &entry.score.to_string());
                }
            }
            y += row_h;
        }

        // Comments block.
        y += 22.0;
        let lead_w = width * 0.25;
        c.shade(MARGIN, y, width, row_h);
        c.cell(MARGIN, y, lead_w, row_h);
        c.cell(MARGIN + lead_w, y, width - lead_w, row_h);
        c.text(Font::Regular, BODY_SIZE, MARGIN + 6.0, y + 18.0, "Assessor's Comments");
        c.text(
            Font::Regular,
            BODY_SIZE,
            MARGIN + lead_w + 6.0,
            y + 18.0,
            "Comments (Written Feedback) of the overall Assignment Performance",
        );
        y += row_h;

        let max_chars = ((width - 12.0) / (BODY_SIZE * 0.52)) as usize;
        let mut lines = wrap_text(&payload.assessor_comments, max_chars);
        if lines.len() > MAX_COMMENT_LINES {
            lines.truncate(MAX_COMMENT_LINES);
            if let Some(l) = lines.last_mut() {
                l.push_str(" ...");
            }
        }
        let line_h = BODY_SIZE * 1.3;
        let body_h = (lines.len() as f32 * line_h + 12.0).max(86.0);
        c.cell(MARGIN, y, width, body_h);
        for (i, line) in lines.iter().enumerate() {
            c.text(Font::Regular, BODY_SIZE, MARGIN + 6.0, y + 6.0 + line_h * (i as f32 + 1.0) - 3.0, line);
        }
        y += body_h + 22.0;

        // Footer row.
        let foot_h = 32.0;
        let assessor = or(&payload.assessor_name, "Assessor not specified");
        let w1 = width * 0.6;
        let w2 = width * 0.2;
        c.cell(MARGIN, y, w1, foot_h);
        c.cell(MARGIN + w1, y, w2, foot_h);
        c.cell(MARGIN + w1 + w2, y, w2, foot_h);
        c.text(Font::Regular, 12.0, MARGIN + 6.0, y + 20.0, &format!("Assessed by: {assessor}"));
        c.text_centered(Font::Regular, 12.0, MARGIN + w1, w2, y + 20.0, "*Grade (%)");
        c.text_centered(Font::Bold, 12.0, MARGIN + w1 + w2, w2, y + 20.0, &payload.final_grade_text());
        y += foot_h + 22.0;

        c.text(Font::Regular, BODY_SIZE, MARGIN, y, DISCLAIMER);
        c.text_right(Font::Regular, 12.0, right, y + 36.0, date);
        c.ops
    }
}

impl ReportRenderer for PdfReportRenderer {
    fn render(&self, payload: &AssessmentPayload, out_path: &Path) -> anyhow::Result<()> {
        let date = chrono::Local::now().format("%B %Y").to_string();
        let operations = self.draw(payload, &date);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| anyhow!("failed to encode report content: {e}"))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(out_path)
            .map_err(|e| anyhow!("failed to write {}: {e}", out_path.display()))?;
        tracing::debug!(path = %out_path.display(), "report written");
        Ok(())
    }
}
