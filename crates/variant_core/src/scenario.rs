use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{CoreError, CoreErrorCode};
use crate::registry;

const CHARACTER_PROFILE_HEADER: &str = "[character profile]";

/// Where a line sits relative to the file's bracketed sections.
///
/// Global properties only exist before the first section header; the one
/// repeating section of interest is `[Character Profile]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Preamble,
    CharacterProfile,
    OtherSection,
}

/// Tracks section state across a single forward pass over the lines.
/// The parser and the rewriter both classify lines through this, so a
/// variant file is sectioned exactly the way its snapshot was.
#[derive(Debug, Clone, Copy)]
pub struct SectionTracker {
    state: SectionState,
}

impl SectionTracker {
    pub fn new() -> Self {
        Self {
            state: SectionState::Preamble,
        }
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    /// Consumes one line; returns true if it was a section header.
    pub fn observe(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if !trimmed.starts_with('[') {
            return false;
        }
        if trimmed.eq_ignore_ascii_case(CHARACTER_PROFILE_HEADER) {
            self.state = SectionState::CharacterProfile;
        } else {
            self.state = SectionState::OtherSection;
        }
        true
    }
}

impl Default for SectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits a `key=value` line, trimming both sides. Key spelling is
/// preserved for output; matching is done case-insensitively elsewhere.
pub(crate) fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    Some((key.trim(), value.trim()))
}

/// Immutable snapshot of one scenario file.
///
/// `lines` holds every line of the source (without terminators) so the
/// rewriter can reproduce unrecognized content verbatim. The structured
/// maps only carry the numeric fields the modifier registry cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScenario {
    pub lines: Vec<String>,
    pub declared_name: String,
    pub player_profile_name: Option<String>,
    pub global_fields: HashMap<&'static str, f64>,
    pub character_profiles: BTreeMap<String, HashMap<&'static str, f64>>,
}

impl ParsedScenario {
    pub fn global(&self, field: &str) -> Option<f64> {
        self.global_fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(field))
            .map(|(_, v)| *v)
    }

    pub fn global_or(&self, field: &str, default: f64) -> f64 {
        self.global(field).unwrap_or(default)
    }

    pub fn profile_field(&self, profile: &str, field: &str) -> Option<f64> {
        self.character_profiles.get(profile).and_then(|fields| {
            fields
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(field))
                .map(|(_, v)| *v)
        })
    }

    pub fn profile_field_or(&self, profile: &str, field: &str, default: f64) -> f64 {
        self.profile_field(profile, field).unwrap_or(default)
    }

    /// Character profiles excluding the designated player profile,
    /// sorted by name.
    pub fn non_player_profiles(&self) -> Vec<&str> {
        self.character_profiles
            .keys()
            .map(String::as_str)
            .filter(|name| match &self.player_profile_name {
                Some(player) => !name.eq_ignore_ascii_case(player),
                None => true,
            })
            .collect()
    }
}

pub fn parse_file(path: &Path) -> Result<ParsedScenario, CoreError> {
    let bytes = fs::read(path).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Io,
            format!("cannot read {}: {e}", path.display()),
        )
    })?;
    let contents = String::from_utf8(bytes).map_err(|_| {
        CoreError::new(
            CoreErrorCode::Parse,
            format!("{} is not valid UTF-8", path.display()),
        )
    })?;
    parse_str(&contents)
}

pub fn parse_str(contents: &str) -> Result<ParsedScenario, CoreError> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);

    let lines: Vec<String> = contents.lines().map(str::to_string).collect();

    let mut declared_name = String::new();
    let mut player_profile_name = None;
    let mut global_fields = HashMap::new();
    let mut character_profiles: BTreeMap<String, HashMap<&'static str, f64>> = BTreeMap::new();

    let mut tracker = SectionTracker::new();
    let mut current_profile: Option<String> = None;

    for (index, line) in lines.iter().enumerate() {
        if tracker.observe(line) {
            // A new section header always ends the current profile block.
            current_profile = None;
            continue;
        }
        let Some((key, value)) = split_key_value(line) else {
            continue;
        };

        if key.eq_ignore_ascii_case("playercharacters") {
            let name = value.split('.').next().unwrap_or(value);
            player_profile_name = Some(name.to_string());
        }

        match tracker.state() {
            SectionState::Preamble => {
                if key.eq_ignore_ascii_case("name") {
                    declared_name = value.to_string();
                } else if let Some(field) = registry::canonical_global_field(key) {
                    global_fields.insert(field, parse_number(index, field, value)?);
                }
            }
            SectionState::CharacterProfile => {
                if key.eq_ignore_ascii_case("name") {
                    // A recurring profile name merges into its existing
                    // field map rather than resetting it.
                    character_profiles.entry(value.to_string()).or_default();
                    current_profile = Some(value.to_string());
                } else if let Some(profile) = &current_profile {
                    if let Some(field) = registry::canonical_character_field(key) {
                        let parsed = parse_number(index, field, value)?;
                        if let Some(fields) = character_profiles.get_mut(profile) {
                            fields.insert(field, parsed);
                        }
                    }
                }
            }
            SectionState::OtherSection => {}
        }
    }

    debug!(
        "parsed scenario '{}': {} global fields, {} character profiles",
        declared_name,
        global_fields.len(),
        character_profiles.len()
    );

    Ok(ParsedScenario {
        lines,
        declared_name,
        player_profile_name,
        global_fields,
        character_profiles,
    })
}

fn parse_number(line_index: usize, field: &str, value: &str) -> Result<f64, CoreError> {
    value.parse::<f64>().map_err(|_| {
        CoreError::new(
            CoreErrorCode::Parse,
            format!(
                "line {}: invalid numeric value '{}' for {}",
                line_index + 1,
                value,
                field
            ),
        )
    })
}
