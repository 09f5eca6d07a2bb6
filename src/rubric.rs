use serde::Serialize;
use std::fmt;

/// Narrative feedback must carry at least this many whitespace-delimited words
/// whenever the final grade falls in the comment-required range.
pub const MIN_COMMENT_WORDS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Band {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Band {
    /// Highest band first, the order used by the report table.
    pub const ALL: [Band; 7] = [
        Band::APlus,
        Band::A,
        Band::B,
        Band::C,
        Band::D,
        Band::E,
        Band::F,
    ];

    pub fn letter(self) -> &'static str {
        match self {
            Band::APlus => "A+",
            Band::A => "A",
            Band::B => "B",
            Band::C => "C",
            Band::D => "D",
            Band::E => "E",
            Band::F => "F",
        }
    }

    pub fn parse(s: &str) -> Option<Band> {
        let t = s.trim();
        Band::ALL
            .into_iter()
            .find(|b| b.letter().eq_ignore_ascii_case(t))
    }

    /// Inclusive `(min, max)` score interval.
    pub fn range(self) -> (u8, u8) {
        match self {
            Band::APlus => (80, 100),
            Band::A => (70, 79),
            Band::B => (60, 69),
            Band::C => (50, 59),
            Band::D => (40, 49),
            Band::E => (30, 39),
            Band::F => (0, 29),
        }
    }

    pub fn contains(self, score: u8) -> bool {
        let (min, max) = self.range();
        (min..=max).contains(&score)
    }

    /// Score a criterion snaps to when this band is selected.
    pub fn midpoint(self) -> u8 {
        let (min, max) = self.range();
        (min + max) / 2
    }

    pub fn colour(self) -> &'static str {
        match self {
            Band::APlus => "#4CAF50",
            Band::A => "#8BC34A",
            Band::B => "#CDDC39",
            Band::C => "#FFEB3B",
            Band::D => "#FFC107",
            Band::E => "#FF9800",
            Band::F => "#F44336",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// Maps a 0..=100 score to its band. Scores above 100 are treated as A+.
pub fn band_for(score: u8) -> Band {
    Band::ALL
        .into_iter()
        .find(|b| b.contains(score))
        .unwrap_or(Band::APlus)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Research,
    SubjectKnowledge,
    CriticalAnalysis,
    ProblemSolving,
    PracticalCompetence,
    Communication,
    AcademicIntegrity,
}

impl Criterion {
    pub const ALL: [Criterion; 7] = [
        Criterion::Research,
        Criterion::SubjectKnowledge,
        Criterion::CriticalAnalysis,
        Criterion::ProblemSolving,
        Criterion::PracticalCompetence,
        Criterion::Communication,
        Criterion::AcademicIntegrity,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Criterion::Research => "research",
            Criterion::SubjectKnowledge => "subject_knowledge",
            Criterion::CriticalAnalysis => "critical_analysis",
            Criterion::ProblemSolving => "problem_solving",
            Criterion::PracticalCompetence => "practical_competence",
            Criterion::Communication => "communication",
            Criterion::AcademicIntegrity => "academic_integrity",
        }
    }

    pub fn parse(s: &str) -> Option<Criterion> {
        let t = s.trim();
        Criterion::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(t))
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Criterion::Research => "Research",
            Criterion::SubjectKnowledge => "Subject Knowledge",
            Criterion::CriticalAnalysis => "Critical Analysis",
            Criterion::ProblemSolving => "Testing and Problem-Solving Skills",
            Criterion::PracticalCompetence => "Practical Competence",
            Criterion::Communication => "Communication and Presentation",
            Criterion::AcademicIntegrity => "Academic Integrity",
        }
    }

    /// Percentage weight; the seven weights sum to 100.
    pub fn weight(self) -> u32 {
        match self {
            Criterion::Research => 5,
            Criterion::SubjectKnowledge => 20,
            Criterion::CriticalAnalysis => 25,
            Criterion::ProblemSolving => 30,
            Criterion::PracticalCompetence => 5,
            Criterion::Communication => 10,
            Criterion::AcademicIntegrity => 5,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Criterion::Research => 0,
            Criterion::SubjectKnowledge => 1,
            Criterion::CriticalAnalysis => 2,
            Criterion::ProblemSolving => 3,
            Criterion::PracticalCompetence => 4,
            Criterion::Communication => 5,
            Criterion::AcademicIntegrity => 6,
        }
    }
}

/// Weighted final grade held in tenths of a percent so the one-decimal
/// rounding is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FinalGrade {
    tenths: u32,
}

impl FinalGrade {
    pub fn value(self) -> f64 {
        f64::from(self.tenths) / 10.0
    }

    pub fn comment_required(self) -> bool {
        comment_required(self.value())
    }
}

impl fmt::Display for FinalGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tenths / 10, self.tenths % 10)
    }
}

impl Serialize for FinalGrade {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

/// `round(Σ(score × weight) / 100, 1)`, half-up. Scores are taken in
/// [`Criterion::ALL`] order and are not checked against any band.
pub fn compute_final_grade(scores: [u8; 7]) -> FinalGrade {
    let weighted_sum: u32 = Criterion::ALL
        .iter()
        .zip(scores.iter())
        .map(|(c, s)| u32::from(*s) * c.weight())
        .sum();
    // weighted_sum / 100 in tenths is weighted_sum / 10; add 5 to round half-up.
    FinalGrade {
        tenths: (weighted_sum + 5) / 10,
    }
}

/// Feedback is mandatory in the fail range and the distinction range.
pub fn comment_required(final_grade: f64) -> bool {
    final_grade < 30.0 || final_grade > 69.0
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn comment_meets_minimum(text: &str) -> bool {
    word_count(text) >= MIN_COMMENT_WORDS
}

/// Colour used when displaying a final grade.
pub fn final_grade_colour(final_grade: f64) -> &'static str {
    if final_grade < 30.0 {
        Band::F.colour()
    } else if final_grade < 40.0 {
        Band::E.colour()
    } else if final_grade < 50.0 {
        Band::D.colour()
    } else if final_grade < 60.0 {
        Band::C.colour()
    } else if final_grade < 70.0 {
        Band::B.colour()
    } else {
        Band::APlus.colour()
    }
}
