use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use pokedex_viewer::domain::Theme;
use pokedex_viewer::error::DexError;
use pokedex_viewer::prefs::{self, FilePreferences, PreferenceStore, THEME_KEY};

fn store_in(dir: &tempfile::TempDir) -> FilePreferences {
    let path = Utf8PathBuf::from_path_buf(dir.path().join("nested").join("preferences.json"))
        .unwrap();
    FilePreferences::new(path)
}

#[test]
fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    assert_eq!(store.get(THEME_KEY).unwrap(), None);
}

#[test]
fn values_survive_a_new_handle() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.set(THEME_KEY, "dark").unwrap();
    store.set("other", "value").unwrap();

    let reopened = FilePreferences::new(store.path().to_owned());
    assert_eq!(reopened.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    assert_eq!(reopened.get("other").unwrap().as_deref(), Some("value"));
}

#[test]
fn initial_theme_is_written_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    assert_eq!(prefs::initial_theme(&store, true), Theme::Dark);
    assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));

    assert_eq!(prefs::initial_theme(&store, false), Theme::Dark);
}

#[test]
fn toggle_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let theme = prefs::initial_theme(&store, false);
    assert_eq!(theme, Theme::Light);
    let theme = prefs::toggle_theme(&store, theme).unwrap();
    let theme = prefs::toggle_theme(&store, theme).unwrap();
    let theme = prefs::toggle_theme(&store, theme).unwrap();
    assert_eq!(theme, Theme::Dark);
    assert_eq!(
        FilePreferences::new(store.path().to_owned())
            .get(THEME_KEY)
            .unwrap()
            .as_deref(),
        Some("dark")
    );
}

#[test]
fn corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), "{not json").unwrap();
    assert_matches!(store.get(THEME_KEY), Err(DexError::Preferences(_)));
}

#[test]
fn corrupt_file_falls_back_to_system_theme() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), "{not json").unwrap();

    assert_eq!(prefs::initial_theme(&store, true), Theme::Dark);
    assert_eq!(prefs::initial_theme(&store, false), Theme::Light);
}

#[test]
fn unwritable_location_still_yields_a_theme() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let path = Utf8PathBuf::from_path_buf(blocker.join("preferences.json")).unwrap();
    let store = FilePreferences::new(path);

    assert_eq!(prefs::initial_theme(&store, false), Theme::Light);
    assert_matches!(
        prefs::toggle_theme(&store, Theme::Light),
        Err(DexError::Preferences(_))
    );

    let (theme, err) = prefs::apply_toggle(&store, Theme::Light);
    assert_eq!(theme, Theme::Dark);
    assert_matches!(err, Some(DexError::Preferences(_)));
}
