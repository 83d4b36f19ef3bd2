//! Warrior records and creation-payload validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::WarriorId;
use crate::error::ValidationError;

/// Date format used for `dob` on the wire and in storage.
pub const DOB_FORMAT: &str = "%Y-%m-%d";

/// Search terms longer than this are truncated before querying.
pub const MAX_SEARCH_TERM_CHARS: usize = 100;

/// Default number of rows returned by a search.
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// A stored warrior record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warrior {
    pub id: WarriorId,
    pub name: String,
    pub dob: String,
    pub fight_skills: Vec<String>,
}

/// A validated warrior awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWarrior {
    name: String,
    dob: NaiveDate,
    fight_skills: Vec<String>,
}

impl NewWarrior {
    /// Build a new warrior from already-typed parts.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the name is blank or no skills are given.
    pub fn new(
        name: impl Into<String>,
        dob: NaiveDate,
        fight_skills: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if fight_skills.is_empty() {
            return Err(ValidationError::MissingField("fight_skills"));
        }
        Ok(Self {
            name,
            dob,
            fight_skills,
        })
    }

    /// Validate an untyped JSON body as sent by HTTP clients.
    ///
    /// Field checks run in the order `name`, `dob`, `fight_skills`, so the
    /// first missing field is the one reported.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] describing the first problem found.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let Some(obj) = body.as_object() else {
            return Err(ValidationError::NotJson);
        };

        let name = match obj.get("name") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None => return Err(ValidationError::MissingField("name")),
            Some(Value::String(_)) => return Err(ValidationError::MissingField("name")),
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    field: "name",
                    reason: "must be a string".into(),
                })
            }
        };

        let dob = match obj.get("dob") {
            Some(Value::String(s)) if !s.is_empty() => parse_dob(s)?,
            Some(Value::Null) | None => return Err(ValidationError::MissingField("dob")),
            Some(Value::String(_)) => return Err(ValidationError::MissingField("dob")),
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    field: "dob",
                    reason: "must be a string".into(),
                })
            }
        };

        let fight_skills = match obj.get("fight_skills") {
            Some(Value::Array(items)) if items.is_empty() => {
                return Err(ValidationError::MissingField("fight_skills"))
            }
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    _ => Err(ValidationError::InvalidField {
                        field: "fight_skills",
                        reason: "must contain only strings".into(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(Value::Null) | None => return Err(ValidationError::MissingField("fight_skills")),
            Some(Value::String(s)) if s.is_empty() => {
                return Err(ValidationError::MissingField("fight_skills"))
            }
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    field: "fight_skills",
                    reason: "must be a list".into(),
                })
            }
        };

        Self::new(name, dob, fight_skills)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn dob(&self) -> NaiveDate {
        self.dob
    }

    #[must_use]
    pub fn fight_skills(&self) -> &[String] {
        &self.fight_skills
    }

    /// Attach an identifier, producing the record as it will be stored.
    #[must_use]
    pub fn into_warrior(self, id: WarriorId) -> Warrior {
        Warrior {
            id,
            name: self.name,
            dob: self.dob.format(DOB_FORMAT).to_string(),
            fight_skills: self.fight_skills,
        }
    }
}

fn parse_dob(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw, DOB_FORMAT).map_err(|_| ValidationError::InvalidField {
        field: "dob",
        reason: "must be a date formatted as YYYY-MM-DD".into(),
    })
}

/// Clamp a search term to [`MAX_SEARCH_TERM_CHARS`] characters.
#[must_use]
pub fn truncate_search_term(term: &str) -> &str {
    match term.char_indices().nth(MAX_SEARCH_TERM_CHARS) {
        Some((idx, _)) => &term[..idx],
        None => term,
    }
}
