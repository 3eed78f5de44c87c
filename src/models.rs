//! Data models and structures
//!
//! Defines the story form record, its enumerated choices, and the
//! process-wide configuration used to build the remote clients.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub const MIN_AGE: u32 = 1;
pub const MAX_AGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterKind {
    Human,
    Cat,
    Dog,
    GuineaPig,
}

impl CharacterKind {
    pub const ALL: [CharacterKind; 4] = [
        CharacterKind::Human,
        CharacterKind::Cat,
        CharacterKind::Dog,
        CharacterKind::GuineaPig,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CharacterKind::Human => "Human",
            CharacterKind::Cat => "Cat",
            CharacterKind::Dog => "Dog",
            CharacterKind::GuineaPig => "Guinea Pig",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryLocation {
    School,
    Home,
    Ocean,
    OuterSpace,
}

impl StoryLocation {
    pub const ALL: [StoryLocation; 4] = [
        StoryLocation::School,
        StoryLocation::Home,
        StoryLocation::Ocean,
        StoryLocation::OuterSpace,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StoryLocation::School => "School",
            StoryLocation::Home => "Home",
            StoryLocation::Ocean => "The Ocean",
            StoryLocation::OuterSpace => "Outer Space",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryGenre {
    Adventure,
    Comedy,
    Mystery,
    SciFi,
}

impl StoryGenre {
    pub const ALL: [StoryGenre; 4] = [
        StoryGenre::Adventure,
        StoryGenre::Comedy,
        StoryGenre::Mystery,
        StoryGenre::SciFi,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StoryGenre::Adventure => "Adventure",
            StoryGenre::Comedy => "Comedy",
            StoryGenre::Mystery => "Mystery",
            StoryGenre::SciFi => "Sci-Fi",
        }
    }
}

macro_rules! impl_label_conversions {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            /// Accepts the display label, case-insensitively.
            fn from_str(s: &str) -> Result<Self> {
                let wanted = s.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| Error::Validation(format!("Unknown {}: '{}'", $what, s)))
            }
        }
    };
}

impl_label_conversions!(CharacterKind, "character type");
impl_label_conversions!(StoryLocation, "story location");
impl_label_conversions!(StoryGenre, "story type");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub name: String,
    pub age: u32,
    pub kind: CharacterKind,
}

impl Character {
    pub fn new(name: impl Into<String>, age: u32, kind: CharacterKind) -> Self {
        Self {
            name: name.into(),
            age,
            kind,
        }
    }

    fn validate(&self, label: &str) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(format!("{} needs a name", label)));
        }
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(Error::Validation(format!(
                "{} age must be between {} and {} (got {})",
                label, MIN_AGE, MAX_AGE, self.age
            )));
        }
        Ok(())
    }
}

/// Everything the user has entered for one story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub character1: Character,
    pub character2: Character,
    pub location: StoryLocation,
    pub genre: StoryGenre,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            character1: Character::new("Ada", 7, CharacterKind::Human),
            character2: Character::new("Nina", 5, CharacterKind::Human),
            location: StoryLocation::School,
            genre: StoryGenre::Adventure,
        }
    }
}

impl FormState {
    /// Checks every field; must pass before any remote call is made.
    pub fn validate(&self) -> Result<()> {
        self.character1.validate("Character 1")?;
        self.character2.validate("Character 2")?;
        Ok(())
    }
}

pub const DEFAULT_TEXT_MODEL: &str = "gemini-1.0-pro";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8501";

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gcp_project: String,
    pub gcp_region: String,
    pub gcp_access_token: Option<String>,
    pub openai_api_key: String,
    pub text_model: String,
    pub image_model: String,
    pub stream_text: bool,
    pub vertex_base_url: Option<String>,
    pub openai_base_url: Option<String>,
    pub bind_address: String,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            optional(key).ok_or_else(|| Error::Config(format!("{} not set", key)))
        };

        Ok(Self {
            gcp_project: required("GCP_PROJECT")?,
            gcp_region: required("GCP_REGION")?,
            gcp_access_token: optional("GCP_ACCESS_TOKEN"),
            openai_api_key: required("OPENAI_API_KEY")?,
            text_model: optional("TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: optional("IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            stream_text: optional("STREAM_TEXT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            vertex_base_url: optional("VERTEX_BASE_URL"),
            openai_base_url: optional("OPENAI_BASE_URL"),
            bind_address: optional("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
        })
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
