use crate::registry::fields;
use crate::scenario::ParsedScenario;

/// Special scenario behavior patterns that change which modifiers are
/// valid and how dependent fields cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Archetypes {
    /// Global ScorePerTime present and non-zero: score accrues per
    /// elapsed real time, so Duration and HP edits are meaningless.
    pub score_rate_gauntlet: bool,
    /// A selected profile loses health via negative regen: direct
    /// HP/regen scaling would fight the degeneration mechanic.
    pub degeneration_gauntlet: bool,
}

/// Classifies a snapshot for one task. Depends on the task's profile
/// selection, so flags are recomputed per task and never cached on the
/// scenario.
pub fn classify(scenario: &ParsedScenario, selected_profiles: &[String]) -> Archetypes {
    let score_rate_gauntlet = scenario.global_or(fields::SCORE_PER_TIME, 0.0) != 0.0;

    let degeneration_gauntlet = selected_profiles.iter().any(|name| {
        scenario.profile_field_or(name, fields::HEALTH_REGEN_PER_SEC, 0.0) < 0.0
    });

    Archetypes {
        score_rate_gauntlet,
        degeneration_gauntlet,
    }
}
