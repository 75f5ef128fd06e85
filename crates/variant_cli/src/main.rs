use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::debug;
use serde_json::{Map as JsonMap, Value as JsonValue};
use variant_core::{
    Disposition, Modifier, ParsedScenario, Profile, Settings, VariantTask, classify,
    compute_target_name, parse_file, rewrite,
};

const DEFAULT_EXTENSION: &str = "sce";

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Scenario file path, or a bare scenario name resolved in --folder.
    #[arg(value_name = "SCENARIO")]
    scenario: String,
    /// Folder holding the scenario files (defaults to the settings
    /// profile's folder, then the current directory).
    #[arg(long, value_name = "DIR")]
    folder: Option<PathBuf>,
    #[arg(long, value_delimiter = ',', value_name = "PCT[,PCT...]")]
    size: Vec<f64>,
    #[arg(long, value_delimiter = ',', value_name = "PCT[,PCT...]")]
    speed: Vec<f64>,
    #[arg(long, value_delimiter = ',', value_name = "PCT[,PCT...]")]
    timescale: Vec<f64>,
    #[arg(long, value_delimiter = ',', value_name = "SECS[,SECS...]")]
    duration: Vec<f64>,
    #[arg(long, value_delimiter = ',', value_name = "PCT[,PCT...]")]
    hp: Vec<f64>,
    #[arg(long = "regen", value_delimiter = ',', value_name = "PCT[,PCT...]")]
    regen: Vec<f64>,
    /// Use the enabled candidate values from the settings profile for
    /// every modifier not given explicitly.
    #[arg(long = "from-settings")]
    from_settings: bool,
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// Settings profile to use instead of the last active one.
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,
    /// Character profiles to modify (default: every non-player profile).
    #[arg(long, value_delimiter = ',', value_name = "BOT[,BOT...]")]
    bots: Vec<String>,
    /// Print the parsed scenario instead of generating variants.
    #[arg(long)]
    list: bool,
    #[arg(long)]
    json: bool,
    /// Compute target names without writing any files.
    #[arg(long = "dry-run")]
    dry_run: bool,
    /// Replace existing variant files instead of skipping them.
    #[arg(long)]
    overwrite: bool,
    /// Destination folder for generated files (default: source folder).
    #[arg(long = "out-dir", value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::load(path),
        None => Settings::default_settings(),
    };
    let profile = cli
        .profile
        .as_ref()
        .and_then(|name| settings.profiles.get(name))
        .or_else(|| settings.active_profile());
    let Some(profile) = profile else {
        eprintln!("No usable settings profile");
        process::exit(2);
    };
    if let Some(name) = &cli.profile {
        if !settings.profiles.contains_key(name) {
            eprintln!("Unknown settings profile '{name}'");
            process::exit(2);
        }
    }

    let naming = profile.naming_config().unwrap_or_else(|e| {
        eprintln!("Error in settings tag configuration: {e}");
        process::exit(2);
    });

    let folder = resolve_folder(&cli, profile);
    let source = resolve_source(&cli, &folder);
    let requested_name = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| cli.scenario.clone());
    let extension = source
        .extension()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let scenario = parse_file(&source).unwrap_or_else(|e| {
        eprintln!("Error parsing scenario {}: {e}", source.display());
        process::exit(1);
    });
    debug!(
        "loaded '{}' from {} ({} character profiles)",
        scenario.declared_name,
        source.display(),
        scenario.character_profiles.len()
    );

    let bots: Vec<String> = if cli.bots.is_empty() {
        scenario
            .non_player_profiles()
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        cli.bots.clone()
    };

    if cli.list {
        if cli.json {
            print_scenario_json(&scenario, &bots);
        } else {
            print_scenario_fields(&scenario, &bots);
        }
        return;
    }

    let tasks = collect_tasks(&cli, profile, &bots);
    if tasks.is_empty() {
        eprintln!("No variant values requested; pass --size/--speed/... or --from-settings");
        process::exit(2);
    }

    let out_dir = match &cli.out_dir {
        Some(dir) => dir.clone(),
        None => match source.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => folder.clone(),
        },
    };

    let mut created = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for task in &tasks {
        let target_name =
            compute_target_name(&requested_name, task.modifier, task.value, &naming);
        let target_path = rewrite::variant_path(&out_dir, &target_name, &extension);

        if cli.dry_run {
            println!("would create {}", target_path.display());
            continue;
        }
        if !cli.overwrite && target_path.exists() {
            println!("skipped existing {}", target_path.display());
            skipped += 1;
            continue;
        }

        let disposition = rewrite::apply(
            &scenario,
            task,
            &naming,
            &requested_name,
            &out_dir,
            &extension,
        );
        report_disposition(&disposition, task, &target_path);
        match disposition {
            Disposition::Success => created += 1,
            Disposition::SkippedIncompatible | Disposition::InvalidBaseValue => skipped += 1,
            Disposition::NameNotFound | Disposition::WriteError(_) => failed += 1,
        }
    }

    if !cli.dry_run {
        println!("created {created}, skipped {skipped}, failed {failed}");
    }
    if failed > 0 {
        process::exit(1);
    }
}

fn resolve_folder(cli: &Cli, profile: &Profile) -> PathBuf {
    if let Some(folder) = &cli.folder {
        return folder.clone();
    }
    if cli.settings.is_some() && !profile.folder_path.is_empty() {
        return PathBuf::from(&profile.folder_path);
    }
    PathBuf::from(".")
}

fn resolve_source(cli: &Cli, folder: &Path) -> PathBuf {
    let direct = PathBuf::from(&cli.scenario);
    if direct.exists() || direct.extension().is_some() {
        return direct;
    }
    folder.join(format!("{}.{DEFAULT_EXTENSION}", cli.scenario))
}

fn collect_tasks(cli: &Cli, profile: &Profile, bots: &[String]) -> Vec<VariantTask> {
    let mut tasks = Vec::new();
    for modifier in Modifier::ALL {
        let explicit = match modifier {
            Modifier::Size => &cli.size,
            Modifier::Speed => &cli.speed,
            Modifier::Timescale => &cli.timescale,
            Modifier::Duration => &cli.duration,
            Modifier::Hp => &cli.hp,
            Modifier::RegenRate => &cli.regen,
        };
        let values = if !explicit.is_empty() {
            explicit.clone()
        } else if cli.from_settings {
            profile.enabled_values(modifier)
        } else {
            Vec::new()
        };
        for value in values {
            tasks.push(VariantTask {
                modifier,
                value,
                selected_profiles: bots.to_vec(),
            });
        }
    }
    tasks
}

fn report_disposition(disposition: &Disposition, task: &VariantTask, path: &Path) {
    let label = task.modifier.spec().display_name;
    match disposition {
        Disposition::Success => println!("created {}", path.display()),
        Disposition::SkippedIncompatible => {
            println!("skipped {label} {} (incompatible archetype)", task.value)
        }
        Disposition::InvalidBaseValue => {
            println!("skipped {label} {} (invalid base value)", task.value)
        }
        Disposition::NameNotFound => {
            eprintln!("ERROR {label} {}: scenario name not found in file body", task.value)
        }
        Disposition::WriteError(message) => eprintln!("ERROR {label} {}: {message}", task.value),
    }
}

// ---------------------------------------------------------------------------
// Scenario listing
// ---------------------------------------------------------------------------

fn print_scenario_fields(scenario: &ParsedScenario, bots: &[String]) {
    println!("name={}", scenario.declared_name);
    if let Some(player) = &scenario.player_profile_name {
        println!("player={player}");
    }
    let mut globals: Vec<_> = scenario.global_fields.iter().collect();
    globals.sort_by_key(|(k, _)| *k);
    for (field, value) in globals {
        println!("global.{field}={value}");
    }
    for (name, profile_fields) in &scenario.character_profiles {
        let mut profile_fields: Vec<_> = profile_fields.iter().collect();
        profile_fields.sort_by_key(|(k, _)| *k);
        for (field, value) in profile_fields {
            println!("profile.{name}.{field}={value}");
        }
    }
    let arch = classify(scenario, bots);
    println!("score_rate_gauntlet={}", arch.score_rate_gauntlet);
    println!("degeneration_gauntlet={}", arch.degeneration_gauntlet);
}

fn print_scenario_json(scenario: &ParsedScenario, bots: &[String]) {
    let mut out = JsonMap::new();
    out.insert(
        "name".to_string(),
        JsonValue::String(scenario.declared_name.clone()),
    );
    out.insert(
        "player".to_string(),
        match &scenario.player_profile_name {
            Some(player) => JsonValue::String(player.clone()),
            None => JsonValue::Null,
        },
    );

    let mut globals = JsonMap::new();
    let mut sorted: Vec<_> = scenario.global_fields.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);
    for (field, value) in sorted {
        globals.insert(field.to_string(), json_number(*value));
    }
    out.insert("globals".to_string(), JsonValue::Object(globals));

    let mut profiles = JsonMap::new();
    for (name, profile_fields) in &scenario.character_profiles {
        let mut entry = JsonMap::new();
        let mut sorted: Vec<_> = profile_fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);
        for (field, value) in sorted {
            entry.insert(field.to_string(), json_number(*value));
        }
        profiles.insert(name.clone(), JsonValue::Object(entry));
    }
    out.insert("profiles".to_string(), JsonValue::Object(profiles));

    let arch = classify(scenario, bots);
    out.insert(
        "score_rate_gauntlet".to_string(),
        JsonValue::Bool(arch.score_rate_gauntlet),
    );
    out.insert(
        "degeneration_gauntlet".to_string(),
        JsonValue::Bool(arch.degeneration_gauntlet),
    );

    let rendered = serde_json::to_string_pretty(&JsonValue::Object(out)).unwrap_or_else(|e| {
        eprintln!("Error rendering JSON output: {e}");
        process::exit(1);
    });
    println!("{rendered}");
}

fn json_number(value: f64) -> JsonValue {
    serde_json::Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}
