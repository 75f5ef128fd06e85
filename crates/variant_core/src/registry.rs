use std::fmt;

use serde::{Deserialize, Serialize};

/// Field name spellings as the game engine writes them. Matching against
/// file content is always case-insensitive; these spellings are what goes
/// into the structured maps.
pub mod fields {
    pub const MAIN_BB_RADIUS: &str = "MainBBRadius";
    pub const MAIN_BB_HEAD_RADIUS: &str = "MainBBHeadRadius";
    pub const MAX_SPEED: &str = "MaxSpeed";
    pub const MAX_CROUCH_SPEED: &str = "MaxCrouchSpeed";
    pub const MAX_HEALTH: &str = "MaxHealth";
    pub const HEALTH_REGEN_PER_SEC: &str = "HealthRegenPerSec";
    pub const MIN_RESPAWN_DELAY: &str = "MinRespawnDelay";
    pub const MAX_RESPAWN_DELAY: &str = "MaxRespawnDelay";
    pub const TIMESCALE: &str = "Timescale";
    pub const TIMELIMIT: &str = "Timelimit";
    pub const SCORE_PER_HIT: &str = "ScorePerHit";
    pub const SCORE_PER_DAMAGE: &str = "ScorePerDamage";
    pub const SCORE_PER_KILL: &str = "ScorePerKill";
    pub const SCORE_PER_TIME: &str = "ScorePerTime";
}

/// Global fields the parser captures into `ParsedScenario::global_fields`.
pub const GLOBAL_CAPTURE_FIELDS: [&str; 6] = [
    fields::TIMESCALE,
    fields::TIMELIMIT,
    fields::SCORE_PER_HIT,
    fields::SCORE_PER_DAMAGE,
    fields::SCORE_PER_KILL,
    fields::SCORE_PER_TIME,
];

/// Per-character fields the parser captures, including every modifier
/// target, the regen calculation base, and the respawn delays the
/// archetype cascades need.
pub const CHARACTER_CAPTURE_FIELDS: [&str; 8] = [
    fields::MAIN_BB_RADIUS,
    fields::MAIN_BB_HEAD_RADIUS,
    fields::MAX_SPEED,
    fields::MAX_CROUCH_SPEED,
    fields::MAX_HEALTH,
    fields::HEALTH_REGEN_PER_SEC,
    fields::MIN_RESPAWN_DELAY,
    fields::MAX_RESPAWN_DELAY,
];

/// Score-per-event fields cascaded by the Duration and Timescale rules.
pub const SCORE_EVENT_FIELDS: [&str; 3] = [
    fields::SCORE_PER_HIT,
    fields::SCORE_PER_DAMAGE,
    fields::SCORE_PER_KILL,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Size,
    Speed,
    Timescale,
    Duration,
    Hp,
    RegenRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticKind {
    Multiplier,
    Direct,
    Calculated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    CharacterProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagSuffix {
    Percent,
    Seconds,
}

impl TagSuffix {
    pub fn as_char(&self) -> char {
        match *self {
            Self::Percent => '%',
            Self::Seconds => 's',
        }
    }
}

impl fmt::Display for TagSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierSpec {
    pub display_name: &'static str,
    pub default_tag: &'static str,
    pub arithmetic: ArithmeticKind,
    pub scope: Scope,
    pub target_fields: &'static [&'static str],
    /// Speed's "value > 0" condition: a base of 0 must stay 0.
    pub requires_positive_base: bool,
    /// Present iff `arithmetic` is `Calculated`.
    pub calculation_base: Option<&'static str>,
    pub suffix: TagSuffix,
}

const SIZE_SPEC: ModifierSpec = ModifierSpec {
    display_name: "Size",
    default_tag: "Size",
    arithmetic: ArithmeticKind::Multiplier,
    scope: Scope::CharacterProfile,
    target_fields: &[fields::MAIN_BB_RADIUS, fields::MAIN_BB_HEAD_RADIUS],
    requires_positive_base: false,
    calculation_base: None,
    suffix: TagSuffix::Percent,
};

const SPEED_SPEC: ModifierSpec = ModifierSpec {
    display_name: "Speed",
    default_tag: "Speed",
    arithmetic: ArithmeticKind::Multiplier,
    scope: Scope::CharacterProfile,
    target_fields: &[fields::MAX_SPEED, fields::MAX_CROUCH_SPEED],
    requires_positive_base: true,
    calculation_base: None,
    suffix: TagSuffix::Percent,
};

const TIMESCALE_SPEC: ModifierSpec = ModifierSpec {
    display_name: "Timescale",
    default_tag: "tScale",
    arithmetic: ArithmeticKind::Multiplier,
    scope: Scope::Global,
    target_fields: &[fields::TIMESCALE],
    requires_positive_base: false,
    calculation_base: None,
    suffix: TagSuffix::Percent,
};

const DURATION_SPEC: ModifierSpec = ModifierSpec {
    display_name: "Duration",
    default_tag: "Dur",
    arithmetic: ArithmeticKind::Direct,
    scope: Scope::Global,
    target_fields: &[fields::TIMELIMIT],
    requires_positive_base: false,
    calculation_base: None,
    suffix: TagSuffix::Seconds,
};

const HP_SPEC: ModifierSpec = ModifierSpec {
    display_name: "HP",
    default_tag: "HP",
    arithmetic: ArithmeticKind::Multiplier,
    scope: Scope::CharacterProfile,
    target_fields: &[fields::MAX_HEALTH],
    requires_positive_base: false,
    calculation_base: None,
    suffix: TagSuffix::Percent,
};

const REGEN_RATE_SPEC: ModifierSpec = ModifierSpec {
    display_name: "Regen",
    default_tag: "Regen",
    arithmetic: ArithmeticKind::Calculated,
    scope: Scope::CharacterProfile,
    target_fields: &[fields::HEALTH_REGEN_PER_SEC],
    requires_positive_base: false,
    calculation_base: Some(fields::MAX_HEALTH),
    suffix: TagSuffix::Percent,
};

impl Modifier {
    pub const ALL: [Modifier; 6] = [
        Modifier::Size,
        Modifier::Speed,
        Modifier::Timescale,
        Modifier::Duration,
        Modifier::Hp,
        Modifier::RegenRate,
    ];

    pub fn spec(&self) -> &'static ModifierSpec {
        match *self {
            Self::Size => &SIZE_SPEC,
            Self::Speed => &SPEED_SPEC,
            Self::Timescale => &TIMESCALE_SPEC,
            Self::Duration => &DURATION_SPEC,
            Self::Hp => &HP_SPEC,
            Self::RegenRate => &REGEN_RATE_SPEC,
        }
    }

    /// Stable lowercase key used in settings files and CLI output.
    pub fn key(&self) -> &'static str {
        match *self {
            Self::Size => "size",
            Self::Speed => "speed",
            Self::Timescale => "timescale",
            Self::Duration => "duration",
            Self::Hp => "hp",
            Self::RegenRate => "regen_rate",
        }
    }

    /// Uppercase key used by the legacy settings layout.
    pub fn legacy_key(&self) -> &'static str {
        match *self {
            Self::Size => "SIZE",
            Self::Speed => "SPEED",
            Self::Timescale => "TIMESCALE",
            Self::Duration => "DURATION",
            Self::Hp => "HP",
            Self::RegenRate => "REGEN_RATE",
        }
    }

    /// Name of the candidate-value array in the legacy settings layout.
    pub fn legacy_value_key(&self) -> &'static str {
        match *self {
            Self::Size => "size_percentages",
            Self::Speed => "speed_percentages",
            Self::Timescale => "timescale_percentages",
            Self::Duration => "durations",
            Self::Hp => "hp_percentages",
            Self::RegenRate => "regen_percentages",
        }
    }

    pub fn from_key(key: &str) -> Option<Modifier> {
        match key.to_ascii_lowercase().as_str() {
            "size" => Some(Self::Size),
            "speed" => Some(Self::Speed),
            "timescale" => Some(Self::Timescale),
            "duration" => Some(Self::Duration),
            "hp" => Some(Self::Hp),
            "regen" | "regen_rate" => Some(Self::RegenRate),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spec().display_name)
    }
}

/// Canonical spelling for a captured global field, matched case-insensitively.
pub(crate) fn canonical_global_field(key: &str) -> Option<&'static str> {
    GLOBAL_CAPTURE_FIELDS
        .iter()
        .copied()
        .find(|f| f.eq_ignore_ascii_case(key))
}

/// Canonical spelling for a captured character-profile field.
pub(crate) fn canonical_character_field(key: &str) -> Option<&'static str> {
    CHARACTER_CAPTURE_FIELDS
        .iter()
        .copied()
        .find(|f| f.eq_ignore_ascii_case(key))
}

pub(crate) fn canonical_score_event_field(key: &str) -> Option<&'static str> {
    SCORE_EVENT_FIELDS
        .iter()
        .copied()
        .find(|f| f.eq_ignore_ascii_case(key))
}
