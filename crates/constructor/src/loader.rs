use std::path::Path;

use weir_primitives::Value;

use crate::error::LoadError;

#[cfg(test)]
mod tests;

/// Reads a specification file into a [`Value`] tree.
///
/// The format is chosen by extension: `.json` or `.toml`.
pub fn load_spec(path: impl AsRef<Path>) -> Result<Value, LoadError> {
	let path = path.as_ref();
	let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
	let parse: fn(&str, &Path) -> Result<Value, LoadError> = match extension.as_deref() {
		Some("json") => parse_json,
		Some("toml") => parse_toml,
		_ => return Err(LoadError::UnsupportedFormat { path: path.to_path_buf() }),
	};

	let text = std::fs::read_to_string(path).map_err(|error| LoadError::Io {
		path: path.to_path_buf(),
		error,
	})?;
	let spec = parse(&text, path)?;
	tracing::debug!(path = %path.display(), "loaded specification");
	Ok(spec)
}

fn parse_json(text: &str, path: &Path) -> Result<Value, LoadError> {
	serde_json::from_str(text).map_err(|error| LoadError::Json {
		path: path.to_path_buf(),
		error,
	})
}

fn parse_toml(text: &str, path: &Path) -> Result<Value, LoadError> {
	toml::from_str(text).map_err(|error| LoadError::Toml {
		path: path.to_path_buf(),
		error,
	})
}
