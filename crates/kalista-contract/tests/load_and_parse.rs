//! Integration test: load a contract directory from disk and parse every
//! entry, the way the runner consumes a source.

use std::fs;
use std::path::Path;

use kalista_contract::{load_dir, parse_contract, ContractParseError, ExtensionFilter, SchemaRole, SourceError};

fn write(dir: &Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn fixture_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "users/list.yaml",
        "contractId: users-list\nurl: http://localhost/users\nmethod: GET\nstatus: 200\n\
         response: '{\"type\": \"array\"}'\n",
    );
    write(
        dir.path(),
        "users/nested/get.yml",
        "url: http://localhost/users/1\nmethod: GET\n",
    );
    write(dir.path(), "README.md", "# contracts\n");
    write(dir.path(), "notes.txt", "not a contract\n");
    dir
}

#[test]
fn load_dir_walks_recursively_with_default_filter() {
    let dir = fixture_tree();
    let source = load_dir(dir.path(), &ExtensionFilter::default()).unwrap();
    assert_eq!(source.len(), 2);

    let mut ids: Vec<String> = source.identifiers().map(String::from).collect();
    ids.sort();
    assert!(ids[0].ends_with("users/list.yaml"), "got {ids:?}");
    assert!(ids[1].ends_with("users/nested/get.yml"), "got {ids:?}");
}

#[test]
fn load_dir_honors_exclude_filter() {
    let dir = fixture_tree();
    let source = load_dir(dir.path(), &ExtensionFilter::exclude(["yml", "yaml"])).unwrap();
    assert_eq!(source.len(), 2);
    assert!(source.identifiers().all(|id| id.ends_with(".md") || id.ends_with(".txt")));
}

#[test]
fn load_dir_any_filter_loads_everything() {
    let dir = fixture_tree();
    let source = load_dir(dir.path(), &ExtensionFilter::Any).unwrap();
    assert_eq!(source.len(), 4);
}

#[test]
fn load_dir_accepts_single_file_root() {
    let dir = fixture_tree();
    let file = dir.path().join("notes.txt");
    let source = load_dir(&file, &ExtensionFilter::default()).unwrap();
    assert_eq!(source.len(), 1);
}

#[test]
fn load_dir_missing_root_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_dir(&dir.path().join("absent"), &ExtensionFilter::default()).unwrap_err();
    assert!(matches!(err, SourceError::Root { .. }), "got: {err}");
}

#[cfg(unix)]
#[test]
fn load_dir_skips_non_utf8_names_and_keeps_siblings() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    let contract = "url: http://localhost/\nmethod: GET\n";
    fs::write(dir.path().join(OsStr::from_bytes(b"a\xff.yaml")), contract).unwrap();
    fs::write(dir.path().join(OsStr::from_bytes(b"a\xfe.yaml")), contract).unwrap();
    write(dir.path(), "ok.yaml", contract);

    let source = load_dir(dir.path(), &ExtensionFilter::default()).unwrap();
    assert_eq!(source.len(), 1);
    assert!(source.identifiers().all(|id| id.ends_with("ok.yaml")));
}

#[test]
fn loaded_contracts_parse_independently() {
    let dir = fixture_tree();
    write(
        dir.path(),
        "broken.yaml",
        "url: http://localhost/\nmethod: GET\nresponse: '{not json'\n",
    );
    let source = load_dir(dir.path(), &ExtensionFilter::default()).unwrap();
    assert_eq!(source.len(), 3);

    let mut parsed = 0;
    let mut compile_failures = 0;
    for (id, bytes) in source.iter() {
        match parse_contract(id, bytes) {
            Ok(def) => {
                parsed += 1;
                if def.contract_id() == Some("users-list") {
                    assert!(def.validator(SchemaRole::Response).is_some());
                }
            }
            Err(ContractParseError::SchemaCompile { role, .. }) => {
                assert_eq!(role, SchemaRole::Response);
                compile_failures += 1;
            }
            Err(other) => panic!("unexpected error for {id}: {other}"),
        }
    }
    assert_eq!(parsed, 2);
    assert_eq!(compile_failures, 1);
}
