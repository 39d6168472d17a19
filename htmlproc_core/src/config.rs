use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::HtmlProcError;
use crate::HtmlProcResult;

/// The default comment marker: `<!-- build:... -->`.
pub const DEFAULT_COMMENT_MARKER: &str = "build";

/// The default limit on nested include depth.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"htmlproc.toml",
	".htmlproc.toml",
	".config/htmlproc.toml",
];

/// Settings for the interpolation pass.
///
/// ```toml
/// [template_settings]
/// interpolate = '\{\{([\s\S]+?)\}\}'
/// escape = '\{\{-([\s\S]+?)\}\}'
/// strict = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
	/// Regular expression whose first capture group is the expression to
	/// interpolate. Defaults to `${expression}`.
	pub interpolate: Option<String>,
	/// Regular expression for placeholders whose value is HTML-escaped.
	pub escape: Option<String>,
	/// Fail on unresolvable placeholders instead of leaving them as written.
	pub strict: bool,
}

/// Options for a single processing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
	/// Values available to interpolation and custom block templates.
	pub data: HashMap<String, serde_json::Value>,
	/// The requested environment. Gated blocks are matched against it.
	pub environment: Option<String>,
	/// The token after `<!--` that introduces a directive. It must be an
	/// identifier: ASCII letters, digits and `_`, not starting with a digit.
	pub comment_marker: String,
	/// Remove inactive blocks entirely instead of keeping their markers.
	pub strip: bool,
	/// Expand directives inside included HTML files.
	pub recursive: bool,
	pub template_settings: TemplateSettings,
	/// Custom block definition files, loaded in order.
	pub custom_block_types: Vec<PathBuf>,
	/// How many includes may nest below the processed source. The source
	/// itself is not counted, so files and in-memory strings share the same
	/// limit.
	pub max_include_depth: usize,
}

impl Default for ProcessOptions {
	fn default() -> Self {
		Self {
			data: HashMap::new(),
			environment: None,
			comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
			strip: false,
			recursive: false,
			template_settings: TemplateSettings::default(),
			custom_block_types: vec![],
			max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
		}
	}
}

impl ProcessOptions {
	pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = Some(environment.into());
		self
	}

	pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
		self.data.insert(key.into(), value);
		self
	}
}

/// Data source entry for a `[data]` namespace.
///
/// String entries pick the format from the file extension:
///
/// ```toml
/// [data]
/// site = "site.json"
/// ```
///
/// Typed entries provide an explicit format:
///
/// ```toml
/// [data]
/// banner = { path = "banner", format = "text" }
/// ```
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum DataSource {
	Path(PathBuf),
	Typed(TypedDataSource),
}

impl DataSource {
	pub fn path(&self) -> &Path {
		match self {
			Self::Path(path) => path.as_path(),
			Self::Typed(typed) => typed.path.as_path(),
		}
	}

	/// The data format, explicit or derived from the extension.
	pub fn format(&self) -> String {
		match self {
			Self::Path(path) => {
				path.extension()
					.and_then(|ext| ext.to_str())
					.unwrap_or("")
					.to_ascii_lowercase()
			}
			Self::Typed(typed) => typed.format.trim().to_ascii_lowercase(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct TypedDataSource {
	pub path: PathBuf,
	pub format: String,
}

/// Configuration loaded from an `htmlproc.toml` file. Every key is optional
/// and command-line flags take precedence.
///
/// ```toml
/// environment = "dist"
/// comment_marker = "build"
/// strip = true
/// recursive = true
/// custom_block_types = ["blocks.toml"]
///
/// [template_settings]
/// strict = true
///
/// [data]
/// site = "site.json"
///
/// [variables]
/// version = "1.2.0"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct HtmlProcConfig {
	#[serde(default)]
	pub environment: Option<String>,
	#[serde(default)]
	pub comment_marker: Option<String>,
	#[serde(default)]
	pub strip: Option<bool>,
	#[serde(default)]
	pub recursive: Option<bool>,
	#[serde(default)]
	pub template_settings: Option<TemplateSettings>,
	/// Definition files, relative to the config root.
	#[serde(default)]
	pub custom_block_types: Vec<PathBuf>,
	#[serde(default)]
	pub max_include_depth: Option<usize>,
	/// Map of namespace name to data file, relative to the config root.
	#[serde(default)]
	pub data: HashMap<String, DataSource>,
	/// Inline values merged into the data mapping. Data files win on
	/// conflict.
	#[serde(default)]
	pub variables: HashMap<String, serde_json::Value>,
}

impl HtmlProcConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> HtmlProcResult<Option<HtmlProcConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_file(&config_path).map(Some)
	}

	pub fn load_file(path: &Path) -> HtmlProcResult<HtmlProcConfig> {
		let content = std::fs::read_to_string(path)?;
		let config: HtmlProcConfig =
			toml::from_str(&content).map_err(|e| HtmlProcError::ConfigParse(e.to_string()))?;

		tracing::debug!(path = %path.display(), "loaded config");

		Ok(config)
	}

	/// Read each data file and parse it into a `serde_json::Value` keyed by
	/// namespace, on top of the inline `[variables]`.
	pub fn load_data(&self, root: &Path) -> HtmlProcResult<HashMap<String, serde_json::Value>> {
		let mut data = self.variables.clone();

		let mut namespaces: Vec<_> = self.data.iter().collect();
		namespaces.sort_by(|a, b| a.0.cmp(b.0));

		for (namespace, source) in namespaces {
			let rel_path = source.path();
			let path_display = rel_path.display().to_string();
			let content = std::fs::read_to_string(root.join(rel_path)).map_err(|e| {
				HtmlProcError::DataFile {
					path: path_display.clone(),
					reason: e.to_string(),
				}
			})?;
			let value = parse_data_file(&content, &source.format(), &path_display)?;

			data.insert(namespace.clone(), value);
		}

		Ok(data)
	}

	/// Build processing options from this config. Relative paths resolve
	/// against `root`.
	pub fn into_options(self, root: &Path) -> HtmlProcResult<ProcessOptions> {
		let data = self.load_data(root)?;
		let defaults = ProcessOptions::default();

		Ok(ProcessOptions {
			data,
			environment: self.environment,
			comment_marker: self.comment_marker.unwrap_or(defaults.comment_marker),
			strip: self.strip.unwrap_or(defaults.strip),
			recursive: self.recursive.unwrap_or(defaults.recursive),
			template_settings: self.template_settings.unwrap_or_default(),
			custom_block_types: self
				.custom_block_types
				.into_iter()
				.map(|path| root.join(path))
				.collect(),
			max_include_depth: self.max_include_depth.unwrap_or(defaults.max_include_depth),
		})
	}
}

/// Parse a data file's content into a `serde_json::Value` based on its
/// format.
pub fn parse_data_file(content: &str, format: &str, path_display: &str) -> HtmlProcResult<serde_json::Value> {
	let data_error = |reason: String| {
		HtmlProcError::DataFile {
			path: path_display.to_string(),
			reason,
		}
	};

	match format {
		"text" | "string" | "raw" | "txt" => Ok(serde_json::Value::String(content.to_string())),
		"json" => serde_json::from_str(content).map_err(|e| data_error(e.to_string())),
		"toml" => {
			let toml_value: toml::Value =
				toml::from_str(content).map_err(|e| data_error(e.to_string()))?;
			toml_to_json(toml_value).map_err(data_error)
		}
		"yaml" | "yml" => serde_yaml_ng::from_str(content).map_err(|e| data_error(e.to_string())),
		other => Err(HtmlProcError::UnsupportedDataFormat(other.to_string())),
	}
}

/// Convert a `toml::Value` to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> Result<serde_json::Value, String> {
	let json = match value {
		toml::Value::String(s) => serde_json::Value::String(s),
		toml::Value::Integer(i) => serde_json::Value::Number(i.into()),
		toml::Value::Float(f) => {
			serde_json::Value::Number(
				serde_json::Number::from_f64(f)
					.ok_or_else(|| format!("`{f}` cannot be represented as a JSON number"))?,
			)
		}
		toml::Value::Boolean(b) => serde_json::Value::Bool(b),
		toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
		toml::Value::Array(arr) => {
			let items: Result<Vec<serde_json::Value>, String> =
				arr.into_iter().map(toml_to_json).collect();
			serde_json::Value::Array(items?)
		}
		toml::Value::Table(table) => {
			let mut map = serde_json::Map::new();
			for (k, v) in table {
				map.insert(k, toml_to_json(v)?);
			}
			serde_json::Value::Object(map)
		}
	};

	Ok(json)
}
