use crate::error::{AssessError, ValidationError};
use crate::report::{AssessmentPayload, CriterionScore, ReportRenderer, NO_COMMENT_TEXT};
use crate::rubric::{
    band_for, comment_meets_minimum, compute_final_grade, final_grade_colour, word_count, Band,
    Criterion, FinalGrade, MIN_COMMENT_WORDS,
};
use crate::store::{RecordStore, StudentRecord};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Surname,
    Course,
    Mode,
    Module,
    ReportTitle,
    Supervisor,
    AssessorName,
}

impl FormField {
    pub fn parse(s: &str) -> Option<FormField> {
        match s.trim() {
            "name" | "studentName" => Some(FormField::Name),
            "surname" | "studentSurname" => Some(FormField::Surname),
            "course" => Some(FormField::Course),
            "mode" => Some(FormField::Mode),
            "module" | "moduleName" => Some(FormField::Module),
            "reportTitle" | "title" => Some(FormField::ReportTitle),
            "supervisor" => Some(FormField::Supervisor),
            "assessorName" | "assessor" => Some(FormField::AssessorName),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFields {
    pub name: String,
    pub surname: String,
    pub course: String,
    pub mode: String,
    pub module: String,
    pub report_title: String,
    pub supervisor: String,
    pub assessor_name: String,
}

impl FormFields {
    fn slot(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Name => &mut self.name,
            FormField::Surname => &mut self.surname,
            FormField::Course => &mut self.course,
            FormField::Mode => &mut self.mode,
            FormField::Module => &mut self.module,
            FormField::ReportTitle => &mut self.report_title,
            FormField::Supervisor => &mut self.supervisor,
            FormField::AssessorName => &mut self.assessor_name,
        }
    }

    /// Clears the record-derived fields; the assessor stays selected.
    fn clear_student(&mut self) {
        let assessor = std::mem::take(&mut self.assessor_name);
        *self = FormFields {
            assessor_name: assessor,
            ..FormFields::default()
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CriterionEntry {
    pub band: Band,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Completeness {
    Incomplete { missing: Vec<Criterion> },
    CommentOptional,
    CommentMandatory,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionStatus {
    pub criterion: Criterion,
    pub name: &'static str,
    pub weight: u32,
    pub band: Option<Band>,
    pub score: Option<u8>,
    pub min: Option<u8>,
    pub max: Option<u8>,
}

/// Everything a front end needs to redraw the form, derived from current
/// inputs on every call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub student_id: Option<String>,
    pub fields: FormFields,
    pub criteria: Vec<CriterionStatus>,
    pub completeness: Completeness,
    pub final_grade: Option<FinalGrade>,
    pub final_grade_colour: Option<&'static str>,
    pub comment_required: bool,
    pub comment_opt_in: bool,
    pub comment_words: usize,
    pub min_comment_words: usize,
    pub submittable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocker: Option<String>,
    pub artifact_path: Option<String>,
    pub generation_succeeded: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutcome {
    pub artifact_path: String,
    pub file_name: String,
    pub final_grade: FinalGrade,
    pub record_updated: bool,
    pub already_marked: bool,
    pub previous_grade: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// State of one assessment form. Grading and validation read from here but
/// never cache derived values.
#[derive(Debug, Clone, Default)]
pub struct AssessmentSession {
    student_id: Option<String>,
    fields: FormFields,
    entries: [Option<CriterionEntry>; 7],
    comment: String,
    comment_opt_in: bool,
    assessors: Vec<String>,
    artifact_path: Option<PathBuf>,
    generation_succeeded: bool,
}

impl AssessmentSession {
    /// `assessors` restricts the assessor name when non-empty.
    pub fn new(assessors: Vec<String>) -> Self {
        Self {
            assessors,
            ..Self::default()
        }
    }

    pub fn entry(&self, criterion: Criterion) -> Option<CriterionEntry> {
        self.entries[criterion.index()]
    }

    pub fn select_student(&mut self, record: &StudentRecord) {
        self.student_id = Some(record.student_id.clone());
        self.fields.name = record.name.clone();
        self.fields.surname = record.surname.clone();
        self.fields.course = record.course.clone();
        self.fields.mode = record.mode.clone();
        self.fields.module = record.module.clone();
        self.fields.report_title = record.title.clone();
        self.fields.supervisor = record.supervisor.clone();
        tracing::info!(student_id = %record.student_id, "student selected");
    }

    pub fn clear_student(&mut self) {
        self.student_id = None;
        self.fields.clear_student();
    }

    pub fn set_field(&mut self, field: FormField, value: &str) {
        *self.fields.slot(field) = value.to_string();
    }

    /// Selecting a band snaps the score to the band midpoint.
    pub fn set_band(&mut self, criterion: Criterion, band: Band) -> u8 {
        let score = band.midpoint();
        self.entries[criterion.index()] = Some(CriterionEntry { band, score });
        tracing::debug!(criterion = criterion.key(), band = band.letter(), score, "band selected");
        score
    }

    /// The score must sit inside the selected band; with no band selected the
    /// band is derived from the score.
    pub fn set_score(&mut self, criterion: Criterion, score: u8) -> Result<(), ValidationError> {
        let slot = &mut self.entries[criterion.index()];
        let band = match slot {
            Some(entry) => entry.band,
            None => band_for(score),
        };
        if !band.contains(score) {
            let (min, max) = band.range();
            return Err(ValidationError::ScoreOutOfBand {
                score,
                band: band.letter(),
                min,
                max,
            });
        }
        *slot = Some(CriterionEntry { band, score });
        tracing::debug!(criterion = criterion.key(), score, "score set");
        Ok(())
    }

    pub fn clear_criterion(&mut self, criterion: Criterion) {
        self.entries[criterion.index()] = None;
    }

    pub fn set_comment(&mut self, text: &str) {
        self.comment = text.to_string();
    }

    pub fn set_comment_opt_in(&mut self, enabled: bool) {
        self.comment_opt_in = enabled;
    }

    /// Starts a fresh assessment; the assessor stays selected.
    pub fn reset(&mut self) {
        let assessors = std::mem::take(&mut self.assessors);
        let assessor = std::mem::take(&mut self.fields.assessor_name);
        *self = AssessmentSession::new(assessors);
        self.fields.assessor_name = assessor;
    }

    fn scores(&self) -> Option<[u8; 7]> {
        let mut out = [0u8; 7];
        for (slot, entry) in out.iter_mut().zip(self.entries.iter()) {
            *slot = entry.as_ref()?.score;
        }
        Some(out)
    }

    /// `None` until all seven criteria are scored.
    pub fn final_grade(&self) -> Option<FinalGrade> {
        self.scores().map(compute_final_grade)
    }

    pub fn completeness(&self) -> Completeness {
        let missing: Vec<Criterion> = Criterion::ALL
            .into_iter()
            .filter(|c| self.entries[c.index()].is_none())
            .collect();
        match self.final_grade() {
            Some(grade) if missing.is_empty() => {
                if grade.comment_required() {
                    Completeness::CommentMandatory
                } else {
                    Completeness::CommentOptional
                }
            }
            _ => Completeness::Incomplete { missing },
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.completeness() {
            Completeness::Incomplete { missing } => {
                return Err(ValidationError::Incomplete {
                    missing: missing.iter().map(|c| c.display_name()).collect(),
                });
            }
            Completeness::CommentMandatory => {
                if !comment_meets_minimum(&self.comment) {
                    return Err(ValidationError::CommentTooShort {
                        words: word_count(&self.comment),
                        required: MIN_COMMENT_WORDS,
                    });
                }
            }
            Completeness::CommentOptional => {
                if self.comment_opt_in && self.comment.trim().is_empty() {
                    return Err(ValidationError::CommentEmpty);
                }
            }
        }

        let mut missing_fields = Vec::new();
        if self.fields.name.trim().is_empty() {
            missing_fields.push("Student Name");
        }
        if self.fields.report_title.trim().is_empty() {
            missing_fields.push("Report Title");
        }
        if !missing_fields.is_empty() {
            return Err(ValidationError::MissingFields {
                fields: missing_fields,
            });
        }

        let assessor = self.fields.assessor_name.trim();
        if !self.assessors.is_empty() && !self.assessors.iter().any(|a| a == assessor) {
            return Err(ValidationError::UnknownAssessor {
                name: assessor.to_string(),
            });
        }
        Ok(())
    }

    /// Comment text as it goes into the report and the record store.
    fn report_comment(&self, completeness: &Completeness) -> String {
        let entered = self.comment.trim();
        let wanted = matches!(completeness, Completeness::CommentMandatory) || self.comment_opt_in;
        if wanted && !entered.is_empty() {
            entered.to_string()
        } else {
            NO_COMMENT_TEXT.to_string()
        }
    }

    pub fn payload(&self) -> Result<AssessmentPayload, ValidationError> {
        self.validate()?;
        let completeness = self.completeness();
        let mut scores = Vec::with_capacity(7);
        for criterion in Criterion::ALL {
            // validate() guarantees every entry is present
            let Some(entry) = self.entries[criterion.index()] else {
                return Err(ValidationError::Incomplete {
                    missing: vec![criterion.display_name()],
                });
            };
            scores.push(CriterionScore {
                criterion,
                band: entry.band,
                score: entry.score,
            });
        }
        let mut raw = [0u8; 7];
        for (slot, s) in raw.iter_mut().zip(scores.iter()) {
            *slot = s.score;
        }
        Ok(AssessmentPayload {
            student_id: self.student_id.clone(),
            student_name: self.fields.name.trim().to_string(),
            student_surname: self.fields.surname.trim().to_string(),
            course: self.fields.course.trim().to_string(),
            mode: self.fields.mode.trim().to_string(),
            module_name: self.fields.module.trim().to_string(),
            report_title: self.fields.report_title.trim().to_string(),
            supervisor: self.fields.supervisor.trim().to_string(),
            assessor_name: self.fields.assessor_name.trim().to_string(),
            assessor_comments: self.report_comment(&completeness),
            scores,
            final_grade: compute_final_grade(raw),
        })
    }

    pub fn status(&self) -> SessionStatus {
        let completeness = self.completeness();
        let final_grade = self.final_grade();
        let comment_required = matches!(completeness, Completeness::CommentMandatory);
        let blocker = self.validate().err().map(|e| e.to_string());
        SessionStatus {
            student_id: self.student_id.clone(),
            fields: self.fields.clone(),
            criteria: Criterion::ALL
                .into_iter()
                .map(|c| {
                    let entry = self.entry(c);
                    CriterionStatus {
                        criterion: c,
                        name: c.display_name(),
                        weight: c.weight(),
                        band: entry.map(|e| e.band),
                        score: entry.map(|e| e.score),
                        min: entry.map(|e| e.band.range().0),
                        max: entry.map(|e| e.band.range().1),
                    }
                })
                .collect(),
            completeness,
            final_grade,
            final_grade_colour: final_grade.map(|g| final_grade_colour(g.value())),
            comment_required,
            comment_opt_in: self.comment_opt_in,
            comment_words: word_count(&self.comment),
            min_comment_words: MIN_COMMENT_WORDS,
            submittable: blocker.is_none(),
            blocker,
            artifact_path: self
                .artifact_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            generation_succeeded: self.generation_succeeded,
        }
    }

    /// Validates, renders the report into `reports_dir`, then records the grade.
    /// Render failures leave the session untouched; a failed store write after
    /// a successful render is reported as a warning.
    pub fn generate(
        &mut self,
        renderer: &dyn ReportRenderer,
        store: &RecordStore,
        reports_dir: &Path,
    ) -> Result<GenerateOutcome, AssessError> {
        let payload = self.payload()?;
        let file_name = artifact_file_name(&payload.student_name, chrono::Local::now());
        let path = reports_dir.join(&file_name);

        std::fs::create_dir_all(reports_dir).map_err(|e| {
            AssessError::Render(format!(
                "cannot create report directory {}: {e}",
                reports_dir.display()
            ))
        })?;
        tracing::info!(path = %path.display(), grade = %payload.final_grade, "generating report");
        renderer
            .render(&payload, &path)
            .map_err(|e| AssessError::Render(format!("{e:#}")))?;
        match std::fs::metadata(&path) {
            Ok(m) if m.len() > 0 => {}
            Ok(_) => {
                return Err(AssessError::Render(
                    "PDF file was created but is empty".to_string(),
                ))
            }
            Err(_) => {
                return Err(AssessError::Render(
                    "PDF file was not created. Check directory permissions.".to_string(),
                ))
            }
        }

        self.artifact_path = Some(path.clone());
        self.generation_succeeded = true;

        let mut outcome = GenerateOutcome {
            artifact_path: path.to_string_lossy().to_string(),
            file_name: file_name.clone(),
            final_grade: payload.final_grade,
            record_updated: false,
            already_marked: false,
            previous_grade: None,
            message: format!("PDF report generated successfully: {file_name}"),
            warning: None,
        };
        let Some(student_id) = payload.student_id.as_deref() else {
            tracing::warn!("report generated without a selected student");
            outcome.warning =
                Some("No student selected; the student record was not updated.".to_string());
            return Ok(outcome);
        };
        match store.upsert_grade(student_id, &payload.final_grade_text(), &payload.assessor_comments) {
            Ok(up) => {
                outcome.record_updated = up.updated;
                outcome.already_marked = up.already_marked;
                if let Some(previous) = &up.previous_grade {
                    outcome.warning = Some(format!(
                        "Student already marked ({previous}). The record has been updated anyway."
                    ));
                }
                outcome.previous_grade = up.previous_grade;
            }
            Err(e) => {
                tracing::error!(error = %e, "report generated but record update failed");
                outcome.warning = Some(format!("Student record was not updated: {e}"));
            }
        }
        Ok(outcome)
    }
}

/// `assessment_<name>_<YYYYmmdd_HHMMSS>.pdf`, non-alphanumerics as `_`.
pub fn artifact_file_name<Tz: chrono::TimeZone>(student_name: &str, at: chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let safe: String = student_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("assessment_{}_{}.pdf", safe, at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ColumnMap;
    use chrono::TimeZone;
    use std::cell::Cell;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    struct FakeRenderer {
        fail: bool,
        calls: Cell<usize>,
    }

    impl FakeRenderer {
        fn ok() -> Self {
            Self {
                fail: false,
                calls: Cell::new(0),
            }
        }
    }

    impl ReportRenderer for FakeRenderer {
        fn render(&self, payload: &AssessmentPayload, out_path: &Path) -> anyhow::Result<()> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                anyhow::bail!("printer on fire");
            }
            std::fs::write(out_path, serde_json::to_vec(payload)?)?;
            Ok(())
        }
    }

    fn store(prefix: &str) -> (RecordStore, PathBuf) {
        let dir = temp_dir(prefix);
        let path = dir.join("student_records.csv");
        std::fs::write(
            &path,
            "Student_ID,Name,Surname,Course,Mode,Module,Title,Supervisor,Marks,Comment\n\
1023,Ada,Lovelace,MEng,FT,Embedded Systems,Engines,Dr Babbage,,\n",
        )
        .expect("write store");
        (RecordStore::new(path, ColumnMap::default()), dir)
    }

    fn selected(store: &RecordStore) -> AssessmentSession {
        let mut s = AssessmentSession::new(Vec::new());
        s.select_student(&store.find_by_id("1023").expect("record"));
        s
    }

    fn score_all(s: &mut AssessmentSession, score: u8) {
        for c in Criterion::ALL {
            s.set_band(c, band_for(score));
            s.set_score(c, score).expect("score in band");
        }
    }

    const FIFTEEN: &str = "The analysis lacks depth and the testing section does not support any of the conclusions.";

    #[test]
    fn starts_incomplete_with_all_criteria_missing() {
        let s = AssessmentSession::new(Vec::new());
        match s.completeness() {
            Completeness::Incomplete { missing } => assert_eq!(missing.len(), 7),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(s.final_grade(), None);
        let status = s.status();
        assert!(!status.submittable);
        assert!(!status.comment_required);
    }

    #[test]
    fn band_selection_resets_to_midpoint_and_bounds_score() {
        let mut s = AssessmentSession::new(Vec::new());
        assert_eq!(s.set_band(Criterion::Research, Band::B), 64);
        assert_eq!(s.entry(Criterion::Research).map(|e| e.score), Some(64));

        let err = s.set_score(Criterion::Research, 70).unwrap_err();
        assert!(matches!(err, ValidationError::ScoreOutOfBand { min: 60, max: 69, .. }));
        assert_eq!(s.entry(Criterion::Research).map(|e| e.score), Some(64));

        s.set_score(Criterion::Research, 69).expect("upper edge");
        assert_eq!(s.set_band(Criterion::Research, Band::F), 14);
    }

    #[test]
    fn score_without_band_derives_band() {
        let mut s = AssessmentSession::new(Vec::new());
        s.set_score(Criterion::Communication, 83).expect("score");
        assert_eq!(
            s.entry(Criterion::Communication),
            Some(CriterionEntry {
                band: Band::APlus,
                score: 83
            })
        );
    }

    #[test]
    fn completeness_tracks_comment_requirement() {
        let (store, _) = store("assessd-session-states");
        let mut s = selected(&store);
        score_all(&mut s, 45);
        assert_eq!(s.completeness(), Completeness::CommentOptional);
        s.set_band(Criterion::ProblemSolving, Band::APlus);
        s.set_score(Criterion::ProblemSolving, 100).expect("score");
        // 45 * 70 + 100 * 30 = 6150 -> 61.5
        assert_eq!(s.final_grade().map(|g| g.to_string()), Some("61.5".to_string()));
        score_all(&mut s, 90);
        assert_eq!(s.completeness(), Completeness::CommentMandatory);
        s.clear_criterion(Criterion::Research);
        assert!(matches!(s.completeness(), Completeness::Incomplete { .. }));
    }

    #[test]
    fn mandatory_comment_needs_fifteen_words() {
        let (store, _) = store("assessd-session-comment");
        let mut s = selected(&store);
        score_all(&mut s, 25);
        assert!(matches!(
            s.validate(),
            Err(ValidationError::CommentTooShort { words: 0, .. })
        ));
        s.set_comment("The analysis lacks depth and the testing section does not really support the conclusions.");
        assert!(matches!(
            s.validate(),
            Err(ValidationError::CommentTooShort { words: 14, .. })
        ));
        s.set_comment(FIFTEEN);
        assert_eq!(s.validate(), Ok(()));
        assert_eq!(s.payload().expect("payload").assessor_comments, FIFTEEN);
    }

    #[test]
    fn optional_comment_opt_in_must_not_be_empty() {
        let (store, _) = store("assessd-session-optin");
        let mut s = selected(&store);
        score_all(&mut s, 55);
        assert_eq!(s.validate(), Ok(()));
        assert_eq!(s.payload().expect("payload").assessor_comments, NO_COMMENT_TEXT);

        s.set_comment_opt_in(true);
        assert_eq!(s.validate(), Err(ValidationError::CommentEmpty));
        s.set_comment("Good.");
        assert_eq!(s.payload().expect("payload").assessor_comments, "Good.");

        s.set_comment_opt_in(false);
        assert_eq!(s.payload().expect("payload").assessor_comments, NO_COMMENT_TEXT);
    }

    #[test]
    fn name_and_title_are_required() {
        let mut s = AssessmentSession::new(Vec::new());
        score_all(&mut s, 50);
        assert_eq!(
            s.validate(),
            Err(ValidationError::MissingFields {
                fields: vec!["Student Name", "Report Title"]
            })
        );
        s.set_field(FormField::Name, "Ada");
        s.set_field(FormField::ReportTitle, "Engines");
        assert_eq!(s.validate(), Ok(()));
    }

    #[test]
    fn configured_assessors_restrict_the_name() {
        let (store, _) = store("assessd-session-assessor");
        let mut s = AssessmentSession::new(vec!["Dr Menabrea".to_string()]);
        s.select_student(&store.find_by_id("1023").expect("record"));
        score_all(&mut s, 50);
        assert!(matches!(s.validate(), Err(ValidationError::UnknownAssessor { .. })));
        s.set_field(FormField::AssessorName, "Dr Menabrea");
        assert_eq!(s.validate(), Ok(()));
        s.reset();
        assert_eq!(s.fields.assessor_name, "Dr Menabrea");
        assert!(s.student_id.is_none());
    }

    #[test]
    fn generate_renders_then_persists_displayed_grade() {
        let (store, dir) = store("assessd-session-generate");
        let renderer = FakeRenderer::ok();
        let mut s = selected(&store);
        score_all(&mut s, 45);
        let shown = s.status().final_grade.expect("grade");

        let out = s
            .generate(&renderer, &store, &dir.join("reports"))
            .expect("generate");
        assert!(out.record_updated);
        assert!(!out.already_marked);
        assert_eq!(out.previous_grade, None);
        assert_eq!(out.final_grade, shown);
        assert!(out.file_name.starts_with("assessment_Ada_"));
        assert!(Path::new(&out.artifact_path).is_file());
        assert!(s.status().generation_succeeded);

        let r = store.find_by_id("1023").expect("reload");
        assert_eq!(r.grade.as_deref(), Some("45.0"));
        assert_eq!(r.comment.as_deref(), Some(NO_COMMENT_TEXT));

        let again = s
            .generate(&renderer, &store, &dir.join("reports"))
            .expect("resubmit");
        assert!(again.already_marked);
        assert_eq!(again.previous_grade.as_deref(), Some("45.0"));
        assert!(again.warning.is_some());
        assert_eq!(renderer.calls.get(), 2);
    }

    #[test]
    fn render_failure_leaves_state_and_store_unchanged() {
        let (store, dir) = store("assessd-session-renderfail");
        let renderer = FakeRenderer {
            fail: true,
            calls: Cell::new(0),
        };
        let mut s = selected(&store);
        score_all(&mut s, 45);
        let e = s
            .generate(&renderer, &store, &dir.join("reports"))
            .unwrap_err();
        assert_eq!(e.code(), "render_failed");
        assert!(e.to_string().contains("printer on fire"));
        assert!(!s.status().generation_succeeded);
        assert_eq!(store.find_by_id("1023").expect("reload").grade, None);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn validation_failure_skips_rendering() {
        let (store, dir) = store("assessd-session-invalid");
        let renderer = FakeRenderer::ok();
        let mut s = selected(&store);
        score_all(&mut s, 25);
        let e = s
            .generate(&renderer, &store, &dir.join("reports"))
            .unwrap_err();
        assert_eq!(e.code(), "validation_failed");
        assert_eq!(renderer.calls.get(), 0);
    }

    #[test]
    fn missing_student_is_partial_success() {
        let (store, dir) = store("assessd-session-nostudent");
        let renderer = FakeRenderer::ok();
        let mut s = AssessmentSession::new(Vec::new());
        s.set_field(FormField::Name, "Walk In");
        s.set_field(FormField::ReportTitle, "Untracked");
        score_all(&mut s, 50);
        let out = s
            .generate(&renderer, &store, &dir.join("reports"))
            .expect("rendered");
        assert!(!out.record_updated);
        assert!(out.warning.expect("warning").contains("not updated"));
    }

    #[test]
    fn artifact_name_is_filesystem_safe() {
        let at = chrono::Utc.with_ymd_and_hms(2026, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            artifact_file_name("Ada O'Neil-Smith", at),
            "assessment_Ada_O_Neil_Smith_20260309_140507.pdf"
        );
    }
}
