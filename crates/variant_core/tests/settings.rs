use variant_core::settings::{DEFAULT_PROFILE_NAME, SETTINGS_VERSION};
use variant_core::{CoreErrorCode, Modifier, Settings};

#[test]
fn defaults_round_trip_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");

    let settings = Settings::default_settings();
    settings.save(&path).expect("save should succeed");

    let loaded = Settings::load(&path);
    assert_eq!(loaded, settings);
    assert_eq!(loaded.version, SETTINGS_VERSION);
    assert!(loaded.profiles.contains_key(DEFAULT_PROFILE_NAME));
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = Settings::load(&dir.path().join("nope.json"));
    assert_eq!(loaded, Settings::default_settings());
}

#[test]
fn corrupt_file_degrades_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{not json").expect("write fixture");

    let loaded = Settings::load(&path);
    assert_eq!(loaded, Settings::default_settings());
}

#[test]
fn unsupported_version_is_an_error() {
    let err = Settings::from_json(r#"{"version": 99}"#).expect_err("version 99");
    assert_eq!(err.code, CoreErrorCode::Settings);
}

#[test]
fn default_profile_has_a_valid_naming_config() {
    let settings = Settings::default_settings();
    let profile = settings.active_profile().expect("default profile");
    let naming = profile.naming_config().expect("stock tags are unique");
    assert_eq!(naming.tag_text(Modifier::Timescale), "tScale");
}

#[test]
fn enabled_values_follow_the_stock_selection() {
    let settings = Settings::default_settings();
    let profile = settings.active_profile().expect("default profile");

    assert_eq!(
        profile.enabled_values(Modifier::Duration),
        vec![15.0, 30.0, 90.0]
    );
    assert!(profile.enabled_values(Modifier::Hp).is_empty());
}

#[test]
fn migrates_a_version_one_profile() {
    let legacy = r#"{
        "version": 1,
        "language": "DE",
        "last_active_profile": "Main",
        "profiles": {
            "Main": {
                "folder_path": "D:/Scenarios",
                "size_percentages": [25.0, 75.0],
                "checkboxes": {"SIZE_0": true, "SIZE_1": false},
                "variant_tags": {"SIZE": "Scale"}
            }
        }
    }"#;

    let settings = Settings::from_json(legacy).expect("v1 should migrate");
    assert_eq!(settings.version, SETTINGS_VERSION);
    assert_eq!(settings.language, "DE");
    assert_eq!(settings.last_active_profile, "Main");

    let profile = &settings.profiles["Main"];
    assert_eq!(profile.folder_path, "D:/Scenarios");

    let size = profile.prefs(Modifier::Size).expect("size prefs");
    assert_eq!(size.tag_text, "Scale");
    assert_eq!(size.values.len(), 2);
    assert!(size.values[0].enabled);
    assert_eq!(size.values[0].value, 25.0);
    assert!(!size.values[1].enabled);

    // Modifiers the legacy file never mentioned come back with the
    // stock candidates.
    let hp = profile.prefs(Modifier::Hp).expect("hp prefs");
    assert_eq!(hp.tag_text, "HP");
    assert!(!hp.values.is_empty());
}

#[test]
fn migrates_the_oldest_shared_percentage_list() {
    let legacy = r#"{
        "version": 1,
        "profiles": {
            "Old": {
                "folder_path": "",
                "percentages": [50.0, 150.0]
            }
        }
    }"#;

    let settings = Settings::from_json(legacy).expect("v1 should migrate");
    let profile = &settings.profiles["Old"];

    for modifier in [Modifier::Size, Modifier::Speed, Modifier::Timescale] {
        let prefs = profile.prefs(modifier).expect("prefs");
        let values: Vec<f64> = prefs.values.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![50.0, 150.0], "{modifier:?}");
    }
    // Duration never shared that list; it keeps the stock seconds.
    let duration = profile.prefs(Modifier::Duration).expect("prefs");
    assert_eq!(duration.values[0].value, 15.0);
}

#[test]
fn stale_last_active_profile_is_repointed() {
    let raw = r#"{
        "version": 2,
        "language": "EN",
        "last_active_profile": "Gone",
        "profiles": {
            "Kept": {"folder_path": "", "modifiers": {}}
        }
    }"#;

    let settings = Settings::from_json(raw).expect("should load");
    assert_eq!(settings.last_active_profile, "Kept");
    // Repair refills the emptied modifier table.
    let profile = settings.active_profile().expect("profile");
    assert!(profile.prefs(Modifier::Size).is_some());
}

#[test]
fn duplicate_tags_surface_through_naming_config() {
    let mut settings = Settings::default_settings();
    let profile = settings
        .profiles
        .get_mut(DEFAULT_PROFILE_NAME)
        .expect("default profile");
    let prefs = profile.modifiers.get_mut(Modifier::Speed.key()).expect("speed prefs");
    prefs.tag_text = "Size".to_string();

    let err = profile.naming_config().expect_err("duplicate tag text");
    assert_eq!(err.code, CoreErrorCode::Settings);
}
