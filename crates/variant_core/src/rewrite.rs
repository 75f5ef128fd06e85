use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::archetype::{Archetypes, classify};
use crate::naming::{NamingConfig, compute_target_name};
use crate::registry::{ArithmeticKind, Modifier, Scope, fields};
use crate::registry;
use crate::scenario::{ParsedScenario, SectionState, SectionTracker, split_key_value};

/// One requested output file: which modifier, at what value, applied to
/// which character profiles. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantTask {
    pub modifier: Modifier,
    pub value: f64,
    pub selected_profiles: Vec<String>,
}

/// Outcome of one task, returned as a value so a batch of N tasks
/// always produces N dispositions. Only `NameNotFound` and `WriteError`
/// are failures; `SkippedIncompatible` is an intentional no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Success,
    SkippedIncompatible,
    InvalidBaseValue,
    NameNotFound,
    WriteError(String),
}

impl Disposition {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::NameNotFound | Self::WriteError(_))
    }
}

/// A fully rewritten variant, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedVariant {
    pub scenario_name: String,
    pub lines: Vec<String>,
}

// Fixed decimal precision is a compatibility contract with the game
// engine: global time values get 1 place, rate/score fields 3,
// character-profile fields 5.
const TIME_PRECISION: usize = 1;
const RATE_PRECISION: usize = 3;
const PROFILE_PRECISION: usize = 5;

/// Rewrites the scenario's line sequence for one task.
///
/// `requested_name` is the scenario name the caller believes the file
/// declares; the body's `Name=` line must match it (case-insensitive)
/// or the task is rejected with `NameNotFound`. Pure function of its
/// inputs; the snapshot is never mutated.
pub fn plan(
    scenario: &ParsedScenario,
    task: &VariantTask,
    naming: &NamingConfig,
    requested_name: &str,
) -> Result<PlannedVariant, Disposition> {
    let spec = task.modifier.spec();
    let arch = classify(scenario, &task.selected_profiles);

    if arch.score_rate_gauntlet
        && matches!(task.modifier, Modifier::Duration | Modifier::Hp)
    {
        debug!(
            "skipping {} for '{}': score-rate gauntlet",
            spec.display_name, requested_name
        );
        return Err(Disposition::SkippedIncompatible);
    }
    if arch.degeneration_gauntlet
        && matches!(task.modifier, Modifier::Hp | Modifier::RegenRate)
    {
        debug!(
            "skipping {} for '{}': degeneration gauntlet",
            spec.display_name, requested_name
        );
        return Err(Disposition::SkippedIncompatible);
    }

    let multiplier = task.value / 100.0;

    // Duration works in perceived seconds: a non-unity timescale in the
    // base scenario means the stored time limit is not what the player
    // experiences, so the ratio is taken against limit / timescale.
    let mut new_timelimit = 0.0;
    let mut score_ratio = 1.0;
    if task.modifier == Modifier::Duration {
        let base_timelimit = scenario.global_or(fields::TIMELIMIT, 0.0);
        let base_timescale = scenario.global_or(fields::TIMESCALE, 1.0);

        if base_timelimit <= 0.0 {
            return Err(Disposition::InvalidBaseValue);
        }

        if base_timescale > 0.0 && base_timescale != 1.0 {
            let perceived = base_timelimit / base_timescale;
            score_ratio = if task.value > 0.0 {
                perceived / task.value
            } else {
                1.0
            };
            let duration_multiplier = if perceived > 0.0 {
                task.value / perceived
            } else {
                1.0
            };
            new_timelimit = base_timelimit * duration_multiplier;
        } else {
            score_ratio = if task.value > 0.0 {
                base_timelimit / task.value
            } else {
                1.0
            };
            new_timelimit = task.value;
        }
    }

    let requested_name = requested_name.trim();
    let new_name = compute_target_name(requested_name, task.modifier, task.value, naming);

    let mut lines = scenario.lines.clone();
    let mut tracker = SectionTracker::new();
    let mut current_profile: Option<String> = None;
    let mut found_name = false;
    let player = scenario.player_profile_name.as_deref();

    for i in 0..lines.len() {
        if tracker.observe(&lines[i]) {
            current_profile = None;
            continue;
        }
        let (key, value) = match split_key_value(&lines[i]) {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => continue,
        };

        match tracker.state() {
            SectionState::Preamble => {
                if key.eq_ignore_ascii_case("name") {
                    if value.eq_ignore_ascii_case(requested_name) {
                        lines[i] = format!("{key}={new_name}");
                        found_name = true;
                    }
                    continue;
                }
                if let Some(rewritten) = rewrite_global(
                    scenario,
                    task,
                    &arch,
                    &key,
                    multiplier,
                    new_timelimit,
                    score_ratio,
                ) {
                    lines[i] = rewritten;
                }
            }
            SectionState::CharacterProfile => {
                if key.eq_ignore_ascii_case("name") {
                    current_profile = Some(value);
                    continue;
                }
                let Some(profile) = current_profile.as_deref() else {
                    continue;
                };
                let is_target = Some(profile) != player
                    && task.selected_profiles.iter().any(|p| p == profile);
                if !is_target {
                    continue;
                }
                if let Some(rewritten) = rewrite_profile_field(
                    scenario,
                    task,
                    &arch,
                    profile,
                    &key,
                    multiplier,
                    score_ratio,
                ) {
                    lines[i] = rewritten;
                }
            }
            SectionState::OtherSection => {}
        }
    }

    if !found_name {
        return Err(Disposition::NameNotFound);
    }

    Ok(PlannedVariant {
        scenario_name: new_name,
        lines,
    })
}

/// Plans the task and writes the result to `<name>.<extension>` inside
/// `folder`. Write failures come back as a disposition, never a panic
/// or an error escaping the task boundary.
pub fn apply(
    scenario: &ParsedScenario,
    task: &VariantTask,
    naming: &NamingConfig,
    requested_name: &str,
    folder: &Path,
    extension: &str,
) -> Disposition {
    let planned = match plan(scenario, task, naming, requested_name) {
        Ok(planned) => planned,
        Err(disposition) => return disposition,
    };

    let path = variant_path(folder, &planned.scenario_name, extension);
    let mut contents = planned.lines.join("\n");
    contents.push('\n');

    match fs::write(&path, contents) {
        Ok(()) => Disposition::Success,
        Err(e) => Disposition::WriteError(format!("{}: {e}", path.display())),
    }
}

pub fn variant_path(folder: &Path, scenario_name: &str, extension: &str) -> PathBuf {
    folder.join(format!("{scenario_name}.{extension}"))
}

fn rewrite_global(
    scenario: &ParsedScenario,
    task: &VariantTask,
    arch: &Archetypes,
    key: &str,
    multiplier: f64,
    new_timelimit: f64,
    score_ratio: f64,
) -> Option<String> {
    let spec = task.modifier.spec();

    match task.modifier {
        Modifier::Duration => {
            if key.eq_ignore_ascii_case(fields::TIMELIMIT) {
                return Some(format!("{key}={new_timelimit:.TIME_PRECISION$}"));
            }
            if let Some(field) = registry::canonical_score_event_field(key) {
                // Faster runs award proportionally fewer points so the
                // total achievable score is preserved.
                let base = scenario.global_or(field, 0.0);
                if base > 0.0 {
                    let scaled = base * score_ratio;
                    return Some(format!("{key}={scaled:.RATE_PRECISION$}"));
                }
            }
            None
        }
        Modifier::Timescale => {
            if spec
                .target_fields
                .iter()
                .any(|f| f.eq_ignore_ascii_case(key))
            {
                let base = scenario.global_or(key, 1.0);
                let scaled = base * multiplier;
                return Some(format!("{key}={scaled:.RATE_PRECISION$}"));
            }
            if key.eq_ignore_ascii_case(fields::TIMELIMIT) {
                // Real-world duration stays constant as perceived speed
                // changes.
                let base = scenario.global_or(fields::TIMELIMIT, 0.0);
                if base > 0.0 {
                    let scaled = base * multiplier;
                    return Some(format!("{key}={scaled:.TIME_PRECISION$}"));
                }
                return None;
            }
            if key.eq_ignore_ascii_case(fields::SCORE_PER_TIME)
                && arch.score_rate_gauntlet
                && multiplier > 0.0
            {
                // Award rate tracks elapsed real time, not perceived time.
                let base = scenario.global_or(fields::SCORE_PER_TIME, 0.0);
                let scaled = base / multiplier;
                return Some(format!("{key}={scaled:.RATE_PRECISION$}"));
            }
            if multiplier > 0.0 {
                if let Some(field) = registry::canonical_score_event_field(key) {
                    let base = scenario.global_or(field, 0.0);
                    if base > 0.0 {
                        let scaled = base / multiplier;
                        return Some(format!("{key}={scaled:.RATE_PRECISION$}"));
                    }
                }
            }
            None
        }
        _ => None,
    }
}

fn rewrite_profile_field(
    scenario: &ParsedScenario,
    task: &VariantTask,
    arch: &Archetypes,
    profile: &str,
    key: &str,
    multiplier: f64,
    score_ratio: f64,
) -> Option<String> {
    let spec = task.modifier.spec();
    let is_max_health = key.eq_ignore_ascii_case(fields::MAX_HEALTH);
    let is_respawn_delay = key.eq_ignore_ascii_case(fields::MIN_RESPAWN_DELAY)
        || key.eq_ignore_ascii_case(fields::MAX_RESPAWN_DELAY);

    // Standard registry rule for character-scoped modifiers. MaxHealth
    // is left to the archetype cascade when one claims it, so the field
    // is never scaled twice.
    if spec.scope == Scope::CharacterProfile {
        let cascade_owns_max_health = is_max_health
            && ((arch.score_rate_gauntlet && task.modifier == Modifier::Timescale)
                || (arch.degeneration_gauntlet && task.modifier == Modifier::Duration));

        if !cascade_owns_max_health
            && spec
                .target_fields
                .iter()
                .any(|f| f.eq_ignore_ascii_case(key))
        {
            match spec.arithmetic {
                ArithmeticKind::Multiplier => {
                    let base = scenario.profile_field_or(profile, key, 0.0);
                    let applies = !(spec.requires_positive_base && base <= 0.0);
                    if applies {
                        let scaled = base * multiplier;
                        return Some(format!("{key}={scaled:.PROFILE_PRECISION$}"));
                    }
                }
                ArithmeticKind::Calculated => {
                    // Regen becomes a percentage of max health, not a
                    // scaling of the regen field itself.
                    if let Some(calc_base) = spec.calculation_base {
                        let base = scenario.profile_field_or(profile, calc_base, 0.0);
                        let scaled = base * multiplier;
                        return Some(format!("{key}={scaled:.PROFILE_PRECISION$}"));
                    }
                }
                ArithmeticKind::Direct => {}
            }
        }
    }

    // Score-rate gauntlet + Timescale: effective health and respawn
    // wait must scale with perceived time to keep difficulty constant.
    if arch.score_rate_gauntlet && task.modifier == Modifier::Timescale && multiplier > 0.0 {
        if is_max_health {
            let base = scenario.profile_field_or(profile, fields::MAX_HEALTH, 0.0);
            let scaled = base * multiplier;
            return Some(format!("{key}={scaled:.PROFILE_PRECISION$}"));
        }
        if is_respawn_delay {
            let base = scenario.profile_field_or(profile, key, 0.0);
            let scaled = base * multiplier;
            return Some(format!("{key}={scaled:.PROFILE_PRECISION$}"));
        }
    }

    if arch.degeneration_gauntlet {
        if task.modifier == Modifier::Timescale && multiplier > 0.0 {
            if key.eq_ignore_ascii_case(fields::HEALTH_REGEN_PER_SEC) {
                let base =
                    scenario.profile_field_or(profile, fields::HEALTH_REGEN_PER_SEC, 0.0);
                if base < 0.0 {
                    let scaled = base / multiplier;
                    return Some(format!("{key}={scaled:.PROFILE_PRECISION$}"));
                }
                return None;
            }
            if is_respawn_delay {
                let base = scenario.profile_field_or(profile, key, 0.0);
                let scaled = base * multiplier;
                return Some(format!("{key}={scaled:.PROFILE_PRECISION$}"));
            }
        } else if task.modifier == Modifier::Duration {
            // Attrition density is preserved across the new length by
            // compressing health and respawn delays inversely to the
            // score ratio.
            let compression = if score_ratio > 0.0 {
                1.0 / score_ratio
            } else {
                1.0
            };
            if is_max_health {
                let base = scenario.profile_field_or(profile, fields::MAX_HEALTH, 0.0);
                let scaled = base * compression;
                return Some(format!("{key}={scaled:.PROFILE_PRECISION$}"));
            }
            if is_respawn_delay {
                let base = scenario.profile_field_or(profile, key, 0.0);
                let scaled = base * compression;
                return Some(format!("{key}={scaled:.PROFILE_PRECISION$}"));
            }
        }
    }

    None
}
