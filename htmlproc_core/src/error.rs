use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum HtmlProcError {
	#[error(transparent)]
	#[diagnostic(code(htmlproc::io_error))]
	Io(#[from] std::io::Error),

	#[error("unterminated `{block_type}` block opened in {file} at line {line}")]
	#[diagnostic(
		code(htmlproc::unterminated_block),
		help("add a closing `<!-- /build -->` (or `<!-- endbuild -->`) marker for this block")
	)]
	UnterminatedBlock {
		block_type: String,
		file: String,
		line: usize,
	},

	#[error("unknown block type `{block_type}` in {file} at line {line}")]
	#[diagnostic(
		code(htmlproc::unknown_block_type),
		help(
			"built-in block types: remove, include, ie, js, css; register others with \
			 `custom_block_types`"
		)
	)]
	UnknownBlockType {
		block_type: String,
		file: String,
		line: usize,
	},

	#[error("included file `{path}` not found (included from {from} at line {line})")]
	#[diagnostic(
		code(htmlproc::include_not_found),
		help("include paths are resolved relative to the including file")
	)]
	IncludeNotFound {
		path: String,
		from: String,
		line: usize,
	},

	#[error("circular include detected: {chain}")]
	#[diagnostic(
		code(htmlproc::circular_include),
		help("remove one of the include directives that closes the cycle")
	)]
	CircularInclude { chain: String },

	#[error("include depth limit of {limit} exceeded while including `{path}`")]
	#[diagnostic(
		code(htmlproc::include_depth),
		help("raise `max_include_depth` or flatten the include chain")
	)]
	IncludeDepthExceeded { path: String, limit: usize },

	#[error("failed to load custom block types from `{path}`: {reason}")]
	#[diagnostic(
		code(htmlproc::custom_handler_load),
		help("definition files are TOML, JSON or YAML with a `blocks` list of `{{ name, template }}`")
	)]
	CustomHandlerLoad { path: String, reason: String },

	#[error("could not interpolate `{expression}` in {file}: {reason}")]
	#[diagnostic(
		code(htmlproc::interpolation),
		help("add the missing key to `data` or disable `template_settings.strict`")
	)]
	Interpolation {
		expression: String,
		file: String,
		reason: String,
	},

	#[error("invalid interpolation pattern `{pattern}`: {reason}")]
	#[diagnostic(
		code(htmlproc::invalid_pattern),
		help("the pattern must be a regular expression with one capture group, e.g. `\\{{\\{{(.+?)\\}}\\}}`")
	)]
	InvalidPattern { pattern: String, reason: String },

	#[error("invalid comment marker `{marker}`")]
	#[diagnostic(
		code(htmlproc::invalid_marker),
		help("a comment marker is an identifier of ASCII letters, digits and `_`, e.g. `build`")
	)]
	InvalidMarker { marker: String },

	#[error("custom block `{block_type}` failed to render: {reason}")]
	#[diagnostic(code(htmlproc::template_render))]
	TemplateRender { block_type: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(htmlproc::config_parse),
		help("check that htmlproc.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("failed to load data file `{path}`: {reason}")]
	#[diagnostic(code(htmlproc::data_file))]
	DataFile { path: String, reason: String },

	#[error("unsupported data file format: `{0}`")]
	#[diagnostic(
		code(htmlproc::unsupported_format),
		help("supported formats: text, json, toml, yaml, yml")
	)]
	UnsupportedDataFormat(String),
}

pub type HtmlProcResult<T> = Result<T, HtmlProcError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
