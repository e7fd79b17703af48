// tests/config_env.rs
use calclik::config::{AppConfig, ENV_CONFIG_PATH};
use calclik::entities::{build_strategy, Provider};
use calclik::Granularity;
use std::{env, fs};

const OVERRIDES: [&str; 4] = [
    ENV_CONFIG_PATH,
    "CALCLIK_GRANULARITY",
    "CALCLIK_LOCATION_CAP",
    "CALCLIK_ENTITY_PROVIDER",
];

fn clear_env() {
    for k in OVERRIDES {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn load_uses_env_path_then_default_file_then_defaults() {
    clear_env();
    // Isolate CWD so the repo's own config/ is not read
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    // 1) nothing → defaults
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.segmenter.granularity, Granularity::Paragraph);
    assert_eq!(cfg.extractor.max_location_chars, 100);

    // 2) ./config/calclik.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("calclik.toml"),
        "[extractor]\nmax_location_chars = 50\n",
    )
    .unwrap();
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.extractor.max_location_chars, 50);

    // 3) env path wins
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "[segmenter]\ngranularity = \"sentence\"\nmax_blocks = 99\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.segmenter.granularity, Granularity::Sentence);
    assert_eq!(cfg.segmenter.max_blocks, 10, "clamped by validate");
    assert_eq!(cfg.extractor.max_location_chars, 100);

    // 4) env path pointing nowhere is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(AppConfig::load().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_apply_and_clamp() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("calclik.toml");
    fs::write(&p, "[entities]\nprovider = \"none\"\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p.display().to_string());

    env::set_var("CALCLIK_GRANULARITY", "sentence");
    env::set_var("CALCLIK_LOCATION_CAP", "500");
    env::set_var("CALCLIK_ENTITY_PROVIDER", "lexicon");
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.segmenter.granularity, Granularity::Sentence);
    assert_eq!(cfg.extractor.max_location_chars, 100);
    assert_eq!(cfg.entities.provider, Provider::Lexicon);

    // garbage values are ignored
    env::set_var("CALCLIK_GRANULARITY", "word");
    env::set_var("CALCLIK_LOCATION_CAP", "many");
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.segmenter.granularity, Granularity::Paragraph);
    assert_eq!(cfg.extractor.max_location_chars, 100);

    clear_env();
}

#[serial_test::serial]
#[test]
fn lexicon_provider_loads_directory_or_degrades() {
    clear_env();
    env::remove_var("ENTITY_TEST_MODE");
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("venues.json"),
        r#"{"patterns":[{"regex":"Town Hall","entity_type":"LOC"}]}"#,
    )
    .unwrap();

    let mut cfg = AppConfig::default();
    cfg.entities.provider = Provider::Lexicon;
    cfg.entities.lexicon_dir = tmp.path().to_path_buf();
    assert_eq!(build_strategy(&cfg.entities).name(), "lexicon");

    cfg.entities.lexicon_dir = tmp.path().join("nope");
    assert_eq!(build_strategy(&cfg.entities).name(), "none");

    // forced pattern-only mode
    cfg.entities.lexicon_dir = tmp.path().to_path_buf();
    env::set_var("ENTITY_TEST_MODE", "none");
    assert_eq!(build_strategy(&cfg.entities).name(), "none");
    env::remove_var("ENTITY_TEST_MODE");
}
