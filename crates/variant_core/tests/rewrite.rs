use variant_core::rewrite::{Disposition, PlannedVariant, VariantTask, apply, plan};
use variant_core::{Modifier, NamingConfig, ParsedScenario, parse_str};

const BASE: &str = "\
Name=Boxes
Timelimit=60.0
Timescale=1.000
ScorePerHit=10.000
ScorePerDamage=1.000
ScorePerKill=100.000
PlayerCharacters=player.char
InvalidWeaponThrowsError=false
[Character Profile]
Name=player
MaxHealth=100.00000
[Character Profile]
Name=Bot1
MaxHealth=100.00000
MainBBRadius=2.00000
MainBBHeadRadius=0.50000
MaxSpeed=0.00000
MaxCrouchSpeed=150.00000
MinRespawnDelay=1.00000
MaxRespawnDelay=2.00000
HealthRegenPerSec=0.00000
";

fn scenario(source: &str) -> ParsedScenario {
    parse_str(source).expect("fixture should parse")
}

fn task(modifier: Modifier, value: f64, bots: &[&str]) -> VariantTask {
    VariantTask {
        modifier,
        value,
        selected_profiles: bots.iter().map(|b| b.to_string()).collect(),
    }
}

fn plan_ok(source: &str, t: &VariantTask, requested: &str) -> PlannedVariant {
    let naming = NamingConfig::default();
    plan(&scenario(source), t, &naming, requested).expect("task should plan")
}

fn line<'a>(planned: &'a PlannedVariant, text: &str) -> Option<&'a str> {
    planned.lines.iter().map(String::as_str).find(|l| *l == text)
}

#[test]
fn hp_task_rewrites_only_the_selected_bot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let naming = NamingConfig::default();
    let t = task(Modifier::Hp, 150.0, &["Bot1"]);

    let disposition = apply(&scenario(BASE), &t, &naming, "Boxes", dir.path(), "sce");
    assert_eq!(disposition, Disposition::Success);

    let path = dir.path().join("Boxes HP 150%.sce");
    let contents = std::fs::read_to_string(&path).expect("variant file should exist");

    assert!(contents.contains("Name=Boxes HP 150%\n"));
    assert_eq!(contents.matches("MaxHealth=150.00000").count(), 1);
    // The player profile keeps its health.
    assert_eq!(contents.matches("MaxHealth=100.00000").count(), 1);
    assert!(contents.contains("MainBBRadius=2.00000\n"));
}

#[test]
fn multiplier_at_100_reproduces_every_field() {
    let t = task(Modifier::Size, 100.0, &["Bot1"]);
    let planned = plan_ok(BASE, &t, "Boxes");

    let original: Vec<&str> = BASE.lines().collect();
    assert_eq!(planned.lines.len(), original.len());
    assert_eq!(planned.lines[0], "Name=Boxes Size 100%");
    for (rewritten, original) in planned.lines.iter().zip(&original).skip(1) {
        assert_eq!(rewritten, original);
    }
}

#[test]
fn profile_fields_render_with_five_decimals() {
    let t = task(Modifier::Size, 150.0, &["Bot1"]);
    let planned = plan_ok(BASE, &t, "Boxes");

    assert!(line(&planned, "MainBBRadius=3.00000").is_some());
    assert!(line(&planned, "MainBBHeadRadius=0.75000").is_some());
}

#[test]
fn global_time_fields_render_with_one_decimal() {
    let t = task(Modifier::Timescale, 50.0, &["Bot1"]);
    let planned = plan_ok(BASE, &t, "Boxes");

    assert!(line(&planned, "Timescale=0.500").is_some());
    assert!(line(&planned, "Timelimit=30.0").is_some());
}

#[test]
fn zero_base_speed_stays_zero() {
    let t = task(Modifier::Speed, 150.0, &["Bot1"]);
    let planned = plan_ok(BASE, &t, "Boxes");

    assert!(line(&planned, "MaxSpeed=0.00000").is_some());
    assert!(line(&planned, "MaxCrouchSpeed=225.00000").is_some());
}

#[test]
fn regen_becomes_a_share_of_max_health() {
    let t = task(Modifier::RegenRate, 30.0, &["Bot1"]);
    let planned = plan_ok(BASE, &t, "Boxes");

    // 30% of MaxHealth=100, not a scaling of the regen field itself.
    assert!(line(&planned, "HealthRegenPerSec=30.00000").is_some());
}

#[test]
fn duration_scales_timelimit_and_score_values() {
    let t = task(Modifier::Duration, 30.0, &["Bot1"]);
    let planned = plan_ok(BASE, &t, "Boxes");

    assert_eq!(planned.scenario_name, "Boxes Dur 30s");
    assert!(line(&planned, "Timelimit=30.0").is_some());
    // Halving the run doubles the per-event scores.
    assert!(line(&planned, "ScorePerHit=20.000").is_some());
    assert!(line(&planned, "ScorePerDamage=2.000").is_some());
    assert!(line(&planned, "ScorePerKill=200.000").is_some());
}

#[test]
fn duration_works_in_perceived_seconds_under_timescale() {
    let source = BASE
        .replace("Timelimit=60.0", "Timelimit=120.0")
        .replace("Timescale=1.000", "Timescale=2.000");
    let t = task(Modifier::Duration, 30.0, &["Bot1"]);
    let planned = plan_ok(&source, &t, "Boxes");

    // Perceived duration is 120/2 = 60s; a 30s target halves the
    // stored limit and doubles the scores.
    assert!(line(&planned, "Timelimit=60.0").is_some());
    assert!(line(&planned, "ScorePerHit=20.000").is_some());
}

#[test]
fn duration_rejects_nonpositive_base_timelimit() {
    let source = BASE.replace("Timelimit=60.0", "Timelimit=0.0");
    let naming = NamingConfig::default();
    let t = task(Modifier::Duration, 30.0, &["Bot1"]);

    let err = plan(&scenario(&source), &t, &naming, "Boxes").expect_err("zero base");
    assert_eq!(err, Disposition::InvalidBaseValue);
}

#[test]
fn mismatched_declared_name_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let naming = NamingConfig::default();
    let t = task(Modifier::Hp, 150.0, &["Bot1"]);

    let disposition = apply(&scenario(BASE), &t, &naming, "Spheres", dir.path(), "sce");
    assert_eq!(disposition, Disposition::NameNotFound);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn score_rate_gauntlet_gates_duration_and_hp() {
    let source = format!("ScorePerTime=5.000\n{BASE}");
    let naming = NamingConfig::default();
    let parsed = scenario(&source);

    for modifier in [Modifier::Duration, Modifier::Hp] {
        let t = task(modifier, 150.0, &["Bot1"]);
        let err = plan(&parsed, &t, &naming, "Boxes").expect_err("should be gated");
        assert_eq!(err, Disposition::SkippedIncompatible);
    }
    for modifier in [Modifier::Size, Modifier::Speed, Modifier::Timescale] {
        let t = task(modifier, 150.0, &["Bot1"]);
        assert!(plan(&parsed, &t, &naming, "Boxes").is_ok());
    }
}

#[test]
fn score_rate_gauntlet_timescale_cascades() {
    let source = format!("ScorePerTime=5.000\n{BASE}");
    let t = task(Modifier::Timescale, 50.0, &["Bot1"]);
    let planned = plan_ok(&source, &t, "Boxes");

    assert!(line(&planned, "Timescale=0.500").is_some());
    assert!(line(&planned, "Timelimit=30.0").is_some());
    // Award rate tracks real time: divided by the multiplier.
    assert!(line(&planned, "ScorePerTime=10.000").is_some());
    assert!(line(&planned, "ScorePerHit=20.000").is_some());
    // Bot health and respawn delays scale with perceived time; the
    // player profile is untouched.
    assert!(line(&planned, "MaxHealth=50.00000").is_some());
    assert!(line(&planned, "MaxHealth=100.00000").is_some());
    assert!(line(&planned, "MinRespawnDelay=0.50000").is_some());
    assert!(line(&planned, "MaxRespawnDelay=1.00000").is_some());
}

#[test]
fn degeneration_gauntlet_gates_hp_and_regen_for_selected_bots_only() {
    let source = format!(
        "{BASE}[Character Profile]\nName=Bot2\nMaxHealth=50.00000\nHealthRegenPerSec=1.00000\n"
    )
    .replace("HealthRegenPerSec=0.00000", "HealthRegenPerSec=-2.00000");
    let naming = NamingConfig::default();
    let parsed = scenario(&source);

    for modifier in [Modifier::Hp, Modifier::RegenRate] {
        let t = task(modifier, 150.0, &["Bot1"]);
        let err = plan(&parsed, &t, &naming, "Boxes").expect_err("should be gated");
        assert_eq!(err, Disposition::SkippedIncompatible);
    }
    // Bot2 has no negative regen, so the same tasks go through when the
    // degenerating bot is not selected.
    for modifier in [Modifier::Hp, Modifier::RegenRate] {
        let t = task(modifier, 150.0, &["Bot2"]);
        assert!(plan(&parsed, &t, &naming, "Boxes").is_ok());
    }
}

#[test]
fn degeneration_gauntlet_timescale_divides_negative_regen() {
    let source = BASE.replace("HealthRegenPerSec=0.00000", "HealthRegenPerSec=-2.00000");
    let t = task(Modifier::Timescale, 50.0, &["Bot1"]);
    let planned = plan_ok(&source, &t, "Boxes");

    assert!(line(&planned, "HealthRegenPerSec=-4.00000").is_some());
    assert!(line(&planned, "MinRespawnDelay=0.50000").is_some());
    assert!(line(&planned, "MaxRespawnDelay=1.00000").is_some());
}

#[test]
fn degeneration_gauntlet_duration_compresses_health_and_delays() {
    let source = BASE.replace("HealthRegenPerSec=0.00000", "HealthRegenPerSec=-2.00000");
    let t = task(Modifier::Duration, 30.0, &["Bot1"]);
    let planned = plan_ok(&source, &t, "Boxes");

    assert!(line(&planned, "Timelimit=30.0").is_some());
    assert!(line(&planned, "ScorePerHit=20.000").is_some());
    // Half the duration, half the attrition budget.
    assert!(line(&planned, "MaxHealth=50.00000").is_some());
    assert!(line(&planned, "MinRespawnDelay=0.50000").is_some());
    assert!(line(&planned, "MaxRespawnDelay=1.00000").is_some());
    // The regen field itself is not cascaded by Duration.
    assert!(line(&planned, "HealthRegenPerSec=-2.00000").is_some());
}

#[test]
fn unrecognized_lines_pass_through_verbatim() {
    let t = task(Modifier::Hp, 150.0, &["Bot1"]);
    let planned = plan_ok(BASE, &t, "Boxes");

    assert!(line(&planned, "InvalidWeaponThrowsError=false").is_some());
    assert!(line(&planned, "[Character Profile]").is_some());
}

#[test]
fn player_profile_is_never_modified_even_when_selected() {
    let t = task(Modifier::Hp, 150.0, &["player", "Bot1"]);
    let planned = plan_ok(BASE, &t, "Boxes");

    // Bot1 changed, player untouched.
    assert!(line(&planned, "MaxHealth=150.00000").is_some());
    assert!(line(&planned, "MaxHealth=100.00000").is_some());
}

#[test]
fn duration_swaps_the_tag_in_an_already_tagged_name() {
    let source = BASE.replace("Name=Boxes", "Name=Boxes Dur 60s");
    let t = task(Modifier::Duration, 90.0, &["Bot1"]);
    let planned = plan_ok(&source, &t, "Boxes Dur 60s");

    assert_eq!(planned.scenario_name, "Boxes Dur 90s");
    assert_eq!(planned.lines[0], "Name=Boxes Dur 90s");
}

#[test]
fn reapplying_to_the_same_snapshot_is_idempotent() {
    let parsed = scenario(BASE);
    let naming = NamingConfig::default();
    let t = task(Modifier::Size, 150.0, &["Bot1"]);

    let first = plan(&parsed, &t, &naming, "Boxes").expect("first plan");
    let second = plan(&parsed, &t, &naming, "Boxes").expect("second plan");
    assert_eq!(first, second);
}
