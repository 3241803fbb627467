use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// One decoded spreadsheet row, keyed by the upload sheet's column headers.
/// Missing cells decode as empty strings; everything except the `Student`
/// field is carried through verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Student", default)]
    pub student: String,
    #[serde(rename = "Branch Name", default)]
    pub branch_name: String,
    #[serde(rename = "Course", default)]
    pub course: String,
    #[serde(rename = "Exam Date", default)]
    pub exam_date: String,
    #[serde(rename = "Session", default)]
    pub session: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Session {
    Forenoon,
    Afternoon,
}

impl Session {
    pub fn parse(s: &str) -> Option<Session> {
        let t = s.trim();
        if t.eq_ignore_ascii_case("forenoon") {
            Some(Session::Forenoon)
        } else if t.eq_ignore_ascii_case("afternoon") {
            Some(Session::Afternoon)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Session::Forenoon => "Forenoon",
            Session::Afternoon => "Afternoon",
        }
    }
}

/// Parsed row, ready for allocation. Transient: produced per upload,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub register_number: String,
    pub name: String,
    pub department: String,
    pub exam_date: String,
    pub session: Session,
    pub subject: String,
}

/// Outcome of one attempt at splitting the combined `Student` cell.
/// The variants mirror the pattern chain in `parse_student_field`; the
/// order of that chain is part of the parsing contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentField {
    /// `"Name (ID)"` — id taken from the first parenthesized run.
    Parenthetical {
        name: String,
        register_number: String,
    },
    /// No parentheses; an alphanumeric token of plausible register length
    /// found somewhere in the text.
    EmbeddedCode {
        name: String,
        register_number: String,
    },
    /// No identifiable register number. The row will be dropped.
    Unmatched,
}

static PARENTHESIZED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]*)\)").expect("valid parenthesized regex"));
static ALNUM_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").expect("valid token regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const MIN_REGISTER_LEN: usize = 5;
const MAX_REGISTER_LEN: usize = 12;
const UNKNOWN_NAME: &str = "Unknown";

/// Splits a free-text `Student` cell into name and register number.
///
/// Patterns are tried in order: parenthesized id, then an embedded
/// alphanumeric token of 5-12 characters, then unmatched. Ambiguous inputs
/// (several plausible tokens, ids outside the length window) are an accepted
/// source of false negatives.
pub fn parse_student_field(field: &str) -> StudentField {
    if let Some(caps) = PARENTHESIZED_RE.captures(field) {
        let m = caps.get(0).expect("whole match");
        let name = field[..m.start()].trim().to_string();
        let register_number = caps[1].trim().to_string();
        return StudentField::Parenthetical {
            name,
            register_number,
        };
    }

    for m in ALNUM_TOKEN_RE.find_iter(field) {
        let token = m.as_str();
        // A register number needs at least one digit; plain words of
        // plausible length are part of the name.
        if !token.bytes().any(|b| b.is_ascii_digit()) {
            continue;
        }
        if (MIN_REGISTER_LEN..=MAX_REGISTER_LEN).contains(&token.len()) {
            let mut rest = String::with_capacity(field.len());
            rest.push_str(&field[..m.start()]);
            rest.push(' ');
            rest.push_str(&field[m.end()..]);
            let name = WHITESPACE_RE.replace_all(&rest, " ").trim().to_string();
            return StudentField::EmbeddedCode {
                name,
                register_number: token.to_string(),
            };
        }
    }

    StudentField::Unmatched
}

#[derive(Debug, Clone)]
pub struct ParsedRoster {
    pub records: Vec<StudentRecord>,
    /// Rows excluded because no register number could be determined or the
    /// session value was not one of the two known sessions.
    pub dropped_rows: usize,
}

/// Extracts normalized student records from decoded upload rows, dropping
/// rows whose register number cannot be determined.
pub fn parse_rows(rows: &[RawRow]) -> ParsedRoster {
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped_rows = 0usize;

    for row in rows {
        let (name, register_number) = match parse_student_field(&row.student) {
            StudentField::Parenthetical {
                name,
                register_number,
            }
            | StudentField::EmbeddedCode {
                name,
                register_number,
            } => (name, register_number),
            StudentField::Unmatched => {
                dropped_rows += 1;
                continue;
            }
        };
        if register_number.is_empty() {
            dropped_rows += 1;
            continue;
        }
        let Some(session) = Session::parse(&row.session) else {
            dropped_rows += 1;
            continue;
        };

        let name = if name.is_empty() {
            UNKNOWN_NAME.to_string()
        } else {
            name
        };

        records.push(StudentRecord {
            register_number,
            name,
            department: row.branch_name.clone(),
            exam_date: row.exam_date.clone(),
            session,
            subject: row.course.clone(),
        });
    }

    ParsedRoster {
        records,
        dropped_rows,
    }
}
