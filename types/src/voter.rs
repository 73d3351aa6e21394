//! Voter records as returned by the Registry.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;
use crate::serde_helpers::null_to_default;

/// Opaque Registry identity of a voter record (the `_id` field).
///
/// Distinct from the human-readable voter ID printed on the roll.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterKey(String);

impl VoterKey {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Gender as recorded on the roll.
///
/// OCR'd rolls contain values that match none of the known labels; those
/// deserialize to [`Gender::Unreadable`] instead of failing the whole page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unreadable,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
            Self::Unreadable => "UNREADABLE",
        }
    }

    /// Parse a free-form label, case-insensitively.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            "other" => Self::Other,
            _ => Self::Unreadable,
        }
    }
}

impl From<Option<String>> for Gender {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map(Self::from_label).unwrap_or_default()
    }
}

impl From<Gender> for String {
    fn from(value: Gender) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single voter record.
///
/// Created and destroyed only by the Registry. `has_voted` and `voted_at`
/// are the only fields the client ever patches, and only from a toggle
/// response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: VoterKey,
    #[serde(default, deserialize_with = "null_to_default")]
    pub voter_id: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub name_marathi: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub name_english: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub relation_marathi: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub relation_english: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub house_no: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, deserialize_with = "null_to_default")]
    pub has_voted: bool,
    #[serde(default)]
    pub voted_at: Option<String>,
}

impl Voter {
    /// Name shown in lists and confirmation prompts: English first, then Marathi.
    pub fn display_name(&self) -> &str {
        if !self.name_english.trim().is_empty() {
            &self.name_english
        } else {
            &self.name_marathi
        }
    }

    /// Single-character badge shown in place of an avatar.
    pub fn initial(&self) -> char {
        self.display_name().chars().next().unwrap_or('?')
    }

    /// House number, or `N/A` when the roll left it blank.
    pub fn house_label(&self) -> &str {
        if self.house_no.trim().is_empty() {
            "N/A"
        } else {
            &self.house_no
        }
    }

    /// Age, or `N/A` when missing or zero.
    pub fn age_label(&self) -> String {
        match self.age {
            Some(age) if age > 0 => age.to_string(),
            _ => "N/A".to_string(),
        }
    }

    /// `has_voted == false` implies no timestamp; `has_voted == true` implies one.
    pub fn check_vote_invariant(&self) -> Result<(), TypesError> {
        match (self.has_voted, self.voted_at.as_deref()) {
            (false, None) => Ok(()),
            (true, Some(ts)) if !ts.trim().is_empty() => Ok(()),
            (false, Some(_)) => Err(TypesError::VoteInvariant {
                voter_id: self.id.to_string(),
                reason: "not voted but carries a voted-at timestamp".into(),
            }),
            (true, _) => Err(TypesError::VoteInvariant {
                voter_id: self.id.to_string(),
                reason: "voted without a voted-at timestamp".into(),
            }),
        }
    }

    /// Copy the Registry's answer to a toggle onto this record.
    pub fn apply_toggle(&mut self, result: &ToggleResult) {
        self.has_voted = result.has_voted;
        self.voted_at = result.voted_at.clone();
    }
}

/// Response of `PATCH /api/voters/:id/vote`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResult {
    #[serde(default)]
    pub success: bool,
    pub has_voted: bool,
    #[serde(default)]
    pub voted_at: Option<String>,
}
