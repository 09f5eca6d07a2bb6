use crate::error::AssessError;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    StudentId,
    Name,
    Surname,
    Course,
    Mode,
    Module,
    Title,
    Supervisor,
    Grade,
    Comment,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::StudentId,
        Field::Name,
        Field::Surname,
        Field::Course,
        Field::Mode,
        Field::Module,
        Field::Title,
        Field::Supervisor,
        Field::Grade,
        Field::Comment,
    ];

    /// Key used in the `[columns]` table of the config file.
    pub fn key(self) -> &'static str {
        match self {
            Field::StudentId => "student_id",
            Field::Name => "name",
            Field::Surname => "surname",
            Field::Course => "course",
            Field::Mode => "mode",
            Field::Module => "module",
            Field::Title => "title",
            Field::Supervisor => "supervisor",
            Field::Grade => "grade",
            Field::Comment => "comment",
        }
    }

    pub fn parse(s: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == s.trim())
    }

    fn default_aliases(self) -> &'static [&'static str] {
        match self {
            Field::StudentId => &["Student_ID", "StudentID", "Student ID", "ID"],
            Field::Name => &["Name"],
            Field::Surname => &["Surname"],
            Field::Course => &["Course"],
            Field::Mode => &["Mode"],
            Field::Module => &["Module"],
            Field::Title => &["Title", "Report Title", "ReportTitle"],
            Field::Supervisor => &["Supervisor"],
            Field::Grade => &["Marks", "Mark", "Grade", "Score", "FinalGrade"],
            Field::Comment => &["Comment", "Comments", "Feedback", "AssessorComment"],
        }
    }
}

/// Accepted header names for each canonical field, in preference order.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    aliases: HashMap<Field, Vec<String>>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        let aliases = Field::ALL
            .into_iter()
            .map(|f| {
                (
                    f,
                    f.default_aliases().iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        Self { aliases }
    }
}

impl ColumnMap {
    /// Replaces the alias list for one field. An empty list keeps the defaults.
    pub fn set_aliases(&mut self, field: Field, aliases: Vec<String>) {
        let cleaned: Vec<String> = aliases
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if !cleaned.is_empty() {
            self.aliases.insert(field, cleaned);
        }
    }

    pub fn aliases(&self, field: Field) -> &[String] {
        self.aliases.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Header a missing column is created under.
    fn preferred_header(&self, field: Field) -> String {
        self.aliases(field)
            .first()
            .cloned()
            .unwrap_or_else(|| field.key().to_string())
    }

    fn resolve(&self, headers: &[String]) -> HashMap<Field, usize> {
        let mut out = HashMap::new();
        for field in Field::ALL {
            if let Some(idx) = find_column(headers, self.aliases(field)) {
                out.insert(field, idx);
            }
        }
        out
    }
}

fn find_column(headers: &[String], aliases: &[String]) -> Option<usize> {
    for alias in aliases {
        if let Some(idx) = headers.iter().position(|h| h == alias) {
            return Some(idx);
        }
    }
    for alias in aliases {
        if let Some(idx) = headers.iter().position(|h| h.eq_ignore_ascii_case(alias)) {
            return Some(idx);
        }
    }
    None
}

/// Comparison key for an id cell: the trimmed text, with a trailing `.0`
/// dropped from all-digit ids so `1023.0` written by a spreadsheet matches
/// `1023`. Leading zeros, signs and exponents are kept as written.
pub fn normalize_id(raw: &str) -> String {
    let t = raw.trim();
    if let Some(int) = t.strip_suffix(".0") {
        if !int.is_empty() && int.bytes().all(|b| b.is_ascii_digit()) {
            return int.to_string();
        }
    }
    t.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub student_id: String,
    pub name: String,
    pub surname: String,
    pub course: String,
    pub mode: String,
    pub module: String,
    pub title: String,
    pub supervisor: String,
    pub grade: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOutcome {
    pub updated: bool,
    pub already_marked: bool,
    /// Grade cell as it was before the write, when non-empty.
    pub previous_grade: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCheck {
    pub path: String,
    pub exists: bool,
    pub readable: bool,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub id_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// In-memory copy of the whole store file.
#[derive(Debug, Clone)]
pub struct RecordTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    columns: HashMap<Field, usize>,
}

impl RecordTable {
    pub fn parse(text: &str, map: &ColumnMap) -> RecordTable {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut records = parse_csv(text).into_iter();
        let headers: Vec<String> = records
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        let rows = records
            .filter(|r| r.iter().any(|c| !c.trim().is_empty()))
            .map(|mut r| {
                if r.len() < headers.len() {
                    r.resize(headers.len(), String::new());
                }
                r
            })
            .collect();
        let columns = map.resolve(&headers);
        RecordTable {
            headers,
            rows,
            columns,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when no header matched an id alias and the first column stands in.
    pub fn id_from_first_column(&self) -> bool {
        !self.headers.is_empty() && !self.columns.contains_key(&Field::StudentId)
    }

    /// Falls back to the first column when no id alias is present.
    fn id_column(&self) -> Option<usize> {
        self.columns
            .get(&Field::StudentId)
            .copied()
            .or(if self.headers.is_empty() { None } else { Some(0) })
    }

    fn cell(&self, row: usize, field: Field) -> String {
        self.columns
            .get(&field)
            .and_then(|&c| self.rows[row].get(c))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    pub fn ids(&self) -> Vec<String> {
        let Some(col) = self.id_column() else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|r| r.get(col))
            .map(|v| v.trim().to_string())
            .collect()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        let col = self.id_column()?;
        let wanted = normalize_id(id);
        self.rows
            .iter()
            .position(|r| r.get(col).is_some_and(|v| normalize_id(v) == wanted))
    }

    pub fn record(&self, row: usize) -> StudentRecord {
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        let student_id = self
            .id_column()
            .and_then(|c| self.rows[row].get(c))
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        StudentRecord {
            student_id,
            name: self.cell(row, Field::Name),
            surname: self.cell(row, Field::Surname),
            course: self.cell(row, Field::Course),
            mode: self.cell(row, Field::Mode),
            module: self.cell(row, Field::Module),
            title: self.cell(row, Field::Title),
            supervisor: self.cell(row, Field::Supervisor),
            grade: non_empty(self.cell(row, Field::Grade)),
            comment: non_empty(self.cell(row, Field::Comment)),
        }
    }

    fn ensure_column(&mut self, field: Field, map: &ColumnMap) -> usize {
        if let Some(&idx) = self.columns.get(&field) {
            return idx;
        }
        let header = map.preferred_header(field);
        tracing::info!(column = %header, "adding missing column");
        self.headers.push(header);
        for row in &mut self.rows {
            row.push(String::new());
        }
        let idx = self.headers.len() - 1;
        self.columns.insert(field, idx);
        idx
    }

    /// Writes grade and comment into the first row matching `id`.
    pub fn set_grade(
        &mut self,
        id: &str,
        grade: &str,
        comment: &str,
        map: &ColumnMap,
    ) -> Option<UpsertOutcome> {
        let row = self.position(id)?;
        let grade_col = self.ensure_column(Field::Grade, map);
        let comment_col = self.ensure_column(Field::Comment, map);
        let cells = &mut self.rows[row];
        if cells.len() < self.headers.len() {
            cells.resize(self.headers.len(), String::new());
        }
        let previous = cells[grade_col].trim();
        let previous_grade = if previous.is_empty() {
            None
        } else {
            Some(previous.to_string())
        };
        cells[grade_col] = grade.to_string();
        cells[comment_col] = comment.to_string();
        Some(UpsertOutcome {
            updated: true,
            already_marked: previous_grade.is_some(),
            previous_grade,
        })
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        push_csv_line(&mut out, &self.headers);
        for row in &self.rows {
            push_csv_line(&mut out, row);
        }
        out
    }
}

fn push_csv_line(out: &mut String, cells: &[String]) {
    let line: Vec<String> = cells.iter().map(|c| csv_quote(c)).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') || s != s.trim()
    {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// RFC 4180 style records; quoted fields may contain separators and newlines.
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    buf.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                buf.push(ch);
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut buf)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut buf));
                records.push(std::mem::take(&mut record));
            }
            _ => buf.push(ch),
        }
    }
    if !buf.is_empty() || !record.is_empty() {
        record.push(buf);
        records.push(record);
    }
    records
}

/// Record store backed by a single CSV file, read in full on every call and
/// rewritten in full on every update.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    columns: ColumnMap,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>, columns: ColumnMap) -> Self {
        Self {
            path: path.into(),
            columns,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<RecordTable, AssessError> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| AssessError::io("failed to read", &self.path, e))?;
        let table = RecordTable::parse(&text, &self.columns);
        if table.id_from_first_column() {
            tracing::warn!(
                path = %self.path.display(),
                column = %table.headers[0],
                "no student id column found, using the first column"
            );
        }
        tracing::debug!(
            path = %self.path.display(),
            rows = table.row_count(),
            "loaded record store"
        );
        Ok(table)
    }

    pub fn list_ids(&self) -> Result<Vec<String>, AssessError> {
        Ok(self.load()?.ids())
    }

    pub fn find_by_id(&self, id: &str) -> Result<StudentRecord, AssessError> {
        let table = self.load()?;
        match table.position(id) {
            Some(row) => Ok(table.record(row)),
            None => {
                tracing::warn!(student_id = %id.trim(), "student not found");
                Err(AssessError::NotFound {
                    id: id.trim().to_string(),
                })
            }
        }
    }

    /// Writes grade and comment for `id`. A prior non-empty grade does not block
    /// the write; it is reported through `already_marked`.
    pub fn upsert_grade(
        &self,
        id: &str,
        grade: &str,
        comment: &str,
    ) -> Result<UpsertOutcome, AssessError> {
        let mut table = self.load()?;
        let Some(outcome) = table.set_grade(id, grade, comment, &self.columns) else {
            tracing::warn!(student_id = %id.trim(), "cannot record grade for unknown student");
            return Err(AssessError::NotFound {
                id: id.trim().to_string(),
            });
        };
        if outcome.already_marked {
            tracing::warn!(student_id = %id.trim(), "student already marked, overwriting");
        }
        std::fs::write(&self.path, table.to_csv())
            .map_err(|e| AssessError::io("failed to write", &self.path, e))?;
        tracing::info!(
            student_id = %id.trim(),
            grade,
            comment_len = comment.len(),
            "student record updated"
        );
        Ok(outcome)
    }

    pub fn self_check(&self) -> StoreCheck {
        let mut check = StoreCheck {
            path: self.path.to_string_lossy().to_string(),
            exists: self.path.is_file(),
            readable: false,
            row_count: 0,
            columns: Vec::new(),
            id_column: None,
            error: None,
        };
        if !check.exists {
            check.error = Some("record store file not found".to_string());
            return check;
        }
        match self.load() {
            Ok(table) => {
                check.readable = true;
                check.row_count = table.row_count();
                check.id_column = table.id_column().map(|c| table.headers()[c].clone());
                check.columns = table.headers().to_vec();
            }
            Err(e) => check.error = Some(e.to_string()),
        }
        check
    }
}
