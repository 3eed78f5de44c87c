//! Form state controller
//!
//! Owns one session's editable [`FormState`], applies field edits coming from
//! the UI or the command line, and hands out a validated snapshot when the
//! user asks for a story.

use crate::models::{Character, FormState, MAX_AGE, MIN_AGE};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Character1Name,
    Character1Age,
    Character1Kind,
    Character2Name,
    Character2Age,
    Character2Kind,
    StoryLocation,
    StoryGenre,
}

impl FormField {
    pub const ALL: [FormField; 8] = [
        FormField::Character1Name,
        FormField::Character1Age,
        FormField::Character1Kind,
        FormField::Character2Name,
        FormField::Character2Age,
        FormField::Character2Kind,
        FormField::StoryLocation,
        FormField::StoryGenre,
    ];

    /// Wire name used by the HTML form.
    pub fn key(&self) -> &'static str {
        match self {
            FormField::Character1Name => "character1_name",
            FormField::Character1Age => "character1_age",
            FormField::Character1Kind => "character1_type",
            FormField::Character2Name => "character2_name",
            FormField::Character2Age => "character2_age",
            FormField::Character2Kind => "character2_type",
            FormField::StoryLocation => "story_location",
            FormField::StoryGenre => "story_type",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormController {
    state: FormState,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Apply one edit. Values that cannot be parsed are rejected and the
    /// previous value is kept; range checks are left to [`Self::submit`].
    pub fn set(&mut self, field: FormField, value: &str) -> Result<()> {
        match field {
            FormField::Character1Name => self.state.character1.name = value.to_string(),
            FormField::Character1Age => self.state.character1.age = parse_age(value, "Character 1")?,
            FormField::Character1Kind => self.state.character1.kind = value.parse()?,
            FormField::Character2Name => self.state.character2.name = value.to_string(),
            FormField::Character2Age => self.state.character2.age = parse_age(value, "Character 2")?,
            FormField::Character2Kind => self.state.character2.kind = value.parse()?,
            FormField::StoryLocation => self.state.location = value.parse()?,
            FormField::StoryGenre => self.state.genre = value.parse()?,
        }
        Ok(())
    }

    /// Apply a batch of `(key, value)` pairs, ignoring keys that are not form
    /// fields. Every pair is applied; the first rejection is returned.
    pub fn apply<'a, I>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut first_error = None;
        for (key, value) in pairs {
            let Some(field) = FormField::from_key(key) else {
                tracing::debug!("Ignoring unknown form field '{}'", key);
                continue;
            };
            if let Err(e) = self.set(field, value) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Snapshot the form for a generation run. Fails before anything leaves
    /// the process if a field is missing or out of range.
    pub fn submit(&self) -> Result<FormState> {
        self.state.validate()?;
        Ok(self.state.clone())
    }

    pub fn character(&self, index: usize) -> Option<&Character> {
        match index {
            1 => Some(&self.state.character1),
            2 => Some(&self.state.character2),
            _ => None,
        }
    }
}

fn parse_age(value: &str, label: &str) -> Result<u32> {
    value.trim().parse::<u32>().map_err(|_| {
        Error::Validation(format!(
            "{} age must be a whole number between {} and {} (got '{}')",
            label, MIN_AGE, MAX_AGE, value
        ))
    })
}
