use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use htmlproc_core::HtmlProcConfig;
use htmlproc_core::HtmlProcResult;
use htmlproc_core::ProcessOptions;

#[derive(Debug, Parser)]
#[command(
	author,
	version,
	about = "Process build comments in HTML files for a target environment.",
	long_about = "htmlproc rewrites HTML files for a requested environment by resolving build \
	              blocks written in HTML comments.\n\nBlocks can remove environment-specific \
	              markup, include partials, inline scripts and styles, and wrap conditional IE \
	              comments. Afterwards `${...}` placeholders are filled from data.\n\nExample:\n  \
	              htmlproc --env dist --strip src/index.html --out-dir dist"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct HtmlProcCli {
	/// HTML files to process. Each file is processed independently.
	#[arg(required = true, value_name = "FILES")]
	pub files: Vec<PathBuf>,

	/// The environment to build for. Gated blocks targeting other
	/// environments are dropped.
	#[arg(long, short)]
	pub env: Option<String>,

	/// The comment marker that introduces a directive (default: `build`).
	#[arg(long, short)]
	pub marker: Option<String>,

	/// Remove inactive blocks entirely instead of keeping their markers.
	#[arg(long, default_value_t = false)]
	pub strip: bool,

	/// Expand build blocks inside included HTML files.
	#[arg(long, short, default_value_t = false)]
	pub recursive: bool,

	/// Fail on placeholders that cannot be resolved.
	#[arg(long, default_value_t = false)]
	pub strict: bool,

	/// A custom block definition file (TOML, JSON or YAML). Repeatable.
	#[arg(long = "custom-block", value_name = "PATH")]
	pub custom_blocks: Vec<PathBuf>,

	/// Set a data value. The value is parsed as JSON when possible and used
	/// as a string otherwise. Repeatable.
	#[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
	pub variables: Vec<(String, serde_json::Value)>,

	/// Path to a config file. Defaults to `htmlproc.toml`, `.htmlproc.toml`
	/// or `.config/htmlproc.toml` in the current directory.
	#[arg(long, short)]
	pub config: Option<PathBuf>,

	/// Write processed files into this directory instead of printing them.
	#[arg(long, short)]
	pub out_dir: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}

impl HtmlProcCli {
	/// Build the processing options: config file values first, then
	/// command-line flags on top.
	pub fn load_options(&self, cwd: &Path) -> HtmlProcResult<ProcessOptions> {
		let config = match &self.config {
			Some(path) => {
				let root = path.parent().map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
				Some((HtmlProcConfig::load_file(path)?, root))
			}
			None => HtmlProcConfig::load(cwd)?.map(|config| (config, cwd.to_path_buf())),
		};

		let mut options = match config {
			Some((config, root)) => config.into_options(&root)?,
			None => ProcessOptions::default(),
		};

		if let Some(env) = &self.env {
			options.environment = Some(env.clone());
		}
		if let Some(marker) = &self.marker {
			options.comment_marker.clone_from(marker);
		}
		options.strip |= self.strip;
		options.recursive |= self.recursive;
		options.template_settings.strict |= self.strict;
		options
			.custom_block_types
			.extend(self.custom_blocks.iter().map(|path| cwd.join(path)));
		options.data.extend(self.variables.iter().cloned());

		Ok(options)
	}
}

/// Parse a `KEY=VALUE` pair for `--set`.
pub fn parse_key_value(raw: &str) -> Result<(String, serde_json::Value), String> {
	let (key, value) = raw
		.split_once('=')
		.ok_or_else(|| format!("expected KEY=VALUE, found `{raw}`"))?;
	let key = key.trim();

	if key.is_empty() {
		return Err(format!("missing key in `{raw}`"));
	}

	let value = serde_json::from_str(value)
		.unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

	Ok((key.to_string(), value))
}
