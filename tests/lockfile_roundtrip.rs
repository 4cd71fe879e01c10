use modlock::lockfile::{LockEntry, Lockfile, LockfileError};
use modlock::version::Version;
use std::io::ErrorKind;
use tempfile::tempdir;

fn entry(name: &str, version: &str) -> LockEntry {
    LockEntry {
        name: name.to_string(),
        version: version.parse::<Version>().unwrap(),
        download_url: format!("/download/{name}/{version}"),
        file_name: format!("{name}_{version}.zip"),
        sha1: "da39a3ee5e6b4b0d3255bfef95601890afd80709".to_string(),
    }
}

#[test]
fn save_and_load_round_trip() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("mods.lock");

    let lock = Lockfile {
        entries: vec![entry("mod-a", "1.2.0"), entry("mod-b", "0.4.3")],
    };
    lock.save_to_path(&path).unwrap();

    let loaded = Lockfile::load_from_path(&path).unwrap();
    assert_eq!(loaded, lock);
    assert_eq!(loaded.entries[0].version, Version::new([1, 2, 0]));
}

#[test]
fn file_is_a_json_array_of_named_fields() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("mods.lock");
    Lockfile { entries: vec![entry("mod-a", "1.0.0")] }
        .save_to_path(&path)
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let first = &raw.as_array().unwrap()[0];
    assert_eq!(first["name"], "mod-a");
    assert_eq!(first["version"], "1.0.0");
    assert_eq!(first["download_url"], "/download/mod-a/1.0.0");
    assert_eq!(first["file_name"], "mod-a_1.0.0.zip");
    assert_eq!(first["sha1"], "da39a3ee5e6b4b0d3255bfef95601890afd80709");
}

#[test]
fn missing_file_is_an_io_not_found() {
    let temp = tempdir().unwrap();
    let err = Lockfile::load_from_path(temp.path().join("absent.lock")).unwrap_err();
    assert!(matches!(err, LockfileError::Io(e) if e.kind() == ErrorKind::NotFound));
}

#[test]
fn garbage_is_malformed_not_io() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("mods.lock");
    std::fs::write(&path, "not json at all").unwrap();
    let err = Lockfile::load_from_path(&path).unwrap_err();
    assert!(matches!(err, LockfileError::Malformed(_)));

    // Structurally valid JSON with a bad version string is also malformed.
    std::fs::write(
        &path,
        r#"[{"name":"a","version":"x.y","download_url":"/d","file_name":"f","sha1":"00"}]"#,
    )
    .unwrap();
    let err = Lockfile::load_from_path(&path).unwrap_err();
    assert!(matches!(err, LockfileError::Malformed(_)));
}
