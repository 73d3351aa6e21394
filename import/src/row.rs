//! Spreadsheet rows and their validated form.

use serde::{Deserialize, Serialize};

use pollcheck_types::Gender;

use crate::error::RowError;

const MIN_AGE: i64 = 18;
const MAX_AGE: i64 = 120;

/// A spreadsheet cell: exporters emit numbers for numeric-looking columns.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    /// Trimmed text, `None` when blank. Whole numbers print without a
    /// fractional part so `12.0` in a house column reads as `12`.
    fn text(&self) -> Option<String> {
        let text = match self {
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        };
        (!text.is_empty()).then_some(text)
    }
}

/// One row as exported from the roll spreadsheet.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SheetRow {
    #[serde(rename = "Voter ID")]
    pub voter_id: Option<Cell>,
    #[serde(rename = "Name (Marathi)")]
    pub name_marathi: Option<Cell>,
    #[serde(rename = "Name (English)")]
    pub name_english: Option<Cell>,
    #[serde(rename = "Relation (Marathi)")]
    pub relation_marathi: Option<Cell>,
    #[serde(rename = "Relation (English)")]
    pub relation_english: Option<Cell>,
    #[serde(rename = "House No")]
    pub house_no: Option<Cell>,
    #[serde(rename = "Age")]
    pub age: Option<Cell>,
    #[serde(rename = "Gender")]
    pub gender: Option<Cell>,
    /// OCR confidence reported by the extraction step, kept as-is.
    #[serde(rename = "Confidence")]
    pub confidence: Option<Cell>,
}

/// A voter record ready for insertion, in the Registry's field names.
///
/// New records never carry vote state.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedVoter {
    pub voter_id: String,
    pub name_marathi: Option<String>,
    pub name_english: Option<String>,
    pub relation_marathi: Option<String>,
    pub relation_english: Option<String>,
    pub house_no: Option<String>,
    pub age: Option<u32>,
    pub gender: Gender,
    pub confidence: Option<String>,
    pub has_voted: bool,
    pub voted_at: Option<String>,
}

fn text(cell: &Option<Cell>) -> Option<String> {
    cell.as_ref().and_then(Cell::text)
}

fn parse_age(cell: &Option<Cell>) -> Result<Option<u32>, RowError> {
    let age = match cell {
        None => return Ok(None),
        Some(Cell::Number(n)) => {
            if n.fract() != 0.0 || !n.is_finite() {
                return Err(RowError::InvalidAge(n.to_string()));
            }
            *n as i64
        }
        Some(Cell::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>()
                .map_err(|_| RowError::InvalidAge(s.to_string()))?
        }
    };
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(RowError::AgeOutOfRange(age));
    }
    // Range-checked above.
    Ok(Some(age as u32))
}

impl SheetRow {
    pub fn validate(&self) -> Result<ImportedVoter, RowError> {
        let voter_id = text(&self.voter_id).ok_or(RowError::MissingVoterId)?;
        Ok(ImportedVoter {
            voter_id,
            name_marathi: text(&self.name_marathi),
            name_english: text(&self.name_english),
            relation_marathi: text(&self.relation_marathi),
            relation_english: text(&self.relation_english),
            house_no: text(&self.house_no),
            age: parse_age(&self.age)?,
            gender: text(&self.gender)
                .map(|g| Gender::from_label(&g))
                .unwrap_or_default(),
            confidence: text(&self.confidence),
            has_voted: false,
            voted_at: None,
        })
    }
}
