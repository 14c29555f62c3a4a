use std::fs;

use taskdesk::config::{Config, CONFIG_FILE};
use taskdesk::error::Error;
use taskdesk::views::SortOrder;

#[test]
fn load_from_dir_rejects_malformed_toml() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(CONFIG_FILE), "[seed\nenabled = true").expect("write");

    let err = Config::load_from_dir(dir.path()).expect_err("malformed");
    assert!(matches!(err, Error::TomlParse(_)));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn load_from_dir_rejects_wrong_types() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join(CONFIG_FILE),
        "[deadlines]\napproaching_days = \"soon\"\n",
    )
    .expect("write");

    assert!(Config::load_from_dir(dir.path()).is_err());
}

#[test]
fn saved_config_loads_back() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(CONFIG_FILE);

    let mut config = Config::default();
    config.deadlines.approaching_days = 7;
    config.tasks.default_sort = "deadline".to_string();
    config.save(&path)?;

    let loaded = Config::load_from_dir(dir.path())?;
    assert_eq!(loaded.deadlines.approaching_days, 7);
    assert_eq!(loaded.tasks.sort_order()?, SortOrder::Deadline);
    assert!(loaded.seed.enabled);
    Ok(())
}
