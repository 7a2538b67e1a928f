use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::*;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
	let path = dir.path().join(name);
	fs::write(&path, contents).unwrap();
	path
}

#[test]
fn json_keeps_document_order() {
	let dir = TempDir::new().unwrap();
	let path = write(
		&dir,
		"app.json",
		r#"{"sources": {"zeta": {"type": "table"}, "alpha": {"type": "table"}}}"#,
	);

	let spec = load_spec(&path).unwrap();
	let sources = spec.get("sources").and_then(Value::as_map).unwrap();
	assert_eq!(sources.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
}

#[test]
fn toml_is_loaded() {
	let dir = TempDir::new().unwrap();
	let path = write(
		&dir,
		"app.TOML",
		"controllers = [\"table_entry\"]\n\n[sources.raw]\ntype = \"table\"\nmax_items = 4\n",
	);

	let spec = load_spec(&path).unwrap();
	assert_eq!(
		spec.get("sources").and_then(|s| s.get("raw")).and_then(|r| r.get("max_items")),
		Some(&Value::Int(4))
	);
	assert_eq!(
		spec.get("controllers"),
		Some(&Value::List(vec![Value::from("table_entry")]))
	);
}

#[test]
fn unknown_extension_is_rejected() {
	let dir = TempDir::new().unwrap();
	let path = write(&dir, "app.yaml", "sources: {}");
	assert!(matches!(load_spec(&path), Err(LoadError::UnsupportedFormat { .. })));
}

#[test]
fn missing_file_reports_path() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("absent.json");
	let err = load_spec(&path).unwrap_err();
	assert!(matches!(err, LoadError::Io { .. }));
	assert!(err.to_string().contains("absent.json"));
}

#[test]
fn malformed_json_is_reported() {
	let dir = TempDir::new().unwrap();
	let path = write(&dir, "app.json", "{\"sources\": ");
	assert!(matches!(load_spec(&path), Err(LoadError::Json { .. })));
}
