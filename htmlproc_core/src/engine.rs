use std::path::Path;
use std::path::PathBuf;

use super::HtmlProcError;
use super::HtmlProcResult;
use crate::BlockRegistry;
use crate::Interpolator;
use crate::ProcessOptions;
use crate::ProcessingContext;
use crate::Span;
use crate::environment::SwitchGroup;
use crate::parser::scan;

/// Rewrites HTML sources for one environment.
///
/// A processor holds the options, the block registry and the compiled
/// interpolation patterns. It is immutable after construction, so one
/// processor can serve any number of threads.
///
/// ```rust
/// use htmlproc_core::HtmlProcessor;
/// use htmlproc_core::ProcessOptions;
///
/// let options = ProcessOptions::default().with_environment("dev");
/// let processor = HtmlProcessor::new(options)?;
/// let html = processor.process_str(
/// 	"<!--build:remove(dev) -->VISIBLE<!--endbuild--> <!--build:remove(prod) -->HIDDEN<!--endbuild-->",
/// 	".",
/// )?;
///
/// assert_eq!(html, "VISIBLE <!--build:remove(prod) --><!--endbuild-->");
/// # Ok::<(), htmlproc_core::HtmlProcError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HtmlProcessor {
	options: ProcessOptions,
	registry: BlockRegistry,
	interpolator: Interpolator,
	data: serde_json::Value,
}

impl HtmlProcessor {
	/// Create a processor with the built-in block types plus every custom
	/// block definition named in `options`.
	pub fn new(options: ProcessOptions) -> HtmlProcResult<Self> {
		Self::with_registry(options, BlockRegistry::with_builtins())
	}

	/// Create a processor on top of an existing registry. Custom block
	/// definitions in `options` are loaded into it, overriding existing
	/// handlers of the same name.
	pub fn with_registry(options: ProcessOptions, mut registry: BlockRegistry) -> HtmlProcResult<Self> {
		if !is_identifier(&options.comment_marker) {
			return Err(HtmlProcError::InvalidMarker {
				marker: options.comment_marker.clone(),
			});
		}

		for path in &options.custom_block_types {
			registry.load_custom(path)?;
		}

		let interpolator = Interpolator::new(&options.template_settings)?;
		let data = interpolation_data(&options);

		tracing::debug!(
			environment = ?options.environment,
			marker = %options.comment_marker,
			block_types = ?registry.block_types(),
			"created processor"
		);

		Ok(Self {
			options,
			registry,
			interpolator,
			data,
		})
	}

	pub fn options(&self) -> &ProcessOptions {
		&self.options
	}

	pub fn registry(&self) -> &BlockRegistry {
		&self.registry
	}

	pub fn interpolator(&self) -> &Interpolator {
		&self.interpolator
	}

	/// The data mapping with the requested `environment` merged in.
	pub fn data(&self) -> &serde_json::Value {
		&self.data
	}

	/// Process in-memory source. Include paths resolve against `base_dir`.
	pub fn process_str(&self, source: &str, base_dir: impl AsRef<Path>) -> HtmlProcResult<String> {
		let context = ProcessingContext::root(self, None, base_dir.as_ref().to_path_buf());
		self.run(source, &context)
	}

	/// Read and process the file at `path`. Include paths resolve against its
	/// directory.
	pub fn process_file(&self, path: impl AsRef<Path>) -> HtmlProcResult<String> {
		let path = path.as_ref().canonicalize()?;
		let source = std::fs::read_to_string(&path)?;
		let base_dir = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
		let context = ProcessingContext::root(self, Some(path), base_dir);

		self.run(&source, &context)
	}

	fn run(&self, source: &str, context: &ProcessingContext<'_>) -> HtmlProcResult<String> {
		let file = context.file_label();
		tracing::debug!(file = %file, bytes = source.len(), "processing");

		let expanded = expand(source, context)?;
		let output = self.interpolator.render(&expanded, &self.data, &file)?;

		tracing::debug!(file = %file, bytes = output.len(), "processed");
		Ok(output)
	}
}

/// Process `source` once with `options`. Include paths resolve against the
/// current directory.
pub fn process(source: &str, options: &ProcessOptions) -> HtmlProcResult<String> {
	HtmlProcessor::new(options.clone())?.process_str(source, ".")
}

/// Scan `source`, resolve every directive against the environment and
/// assemble the output. Interpolation is left to the caller.
pub(crate) fn expand(source: &str, context: &ProcessingContext<'_>) -> HtmlProcResult<String> {
	let options = context.options();
	let registry = context.registry();
	let file = context.file_label();
	let spans = scan(source, &options.comment_marker, &file, registry)?;

	let mut output = String::with_capacity(source.len());
	let mut switch = SwitchGroup::default();

	for span in spans {
		match span {
			Span::Text(text) => {
				if !text.trim().is_empty() {
					switch.reset();
				}
				output.push_str(text);
			}
			Span::Directive(directive) => {
				let handler = registry.resolve(&directive, &file)?;
				let active = switch.admit(&directive, context.environment());

				tracing::debug!(
					file = %file,
					block_type = %directive.block_type,
					targets = ?directive.targets,
					line = directive.start_line,
					active,
					"resolved directive"
				);

				if active {
					output.push_str(&handler.render(&directive, context)?);
				} else if !options.strip {
					output.push_str(&directive.markers());
				}
			}
		}
	}

	Ok(output)
}

/// The data mapping handed to templates: the caller's data plus the
/// requested environment under `environment`, unless the caller set one.
fn interpolation_data(options: &ProcessOptions) -> serde_json::Value {
	let mut data: serde_json::Map<String, serde_json::Value> = options
		.data
		.iter()
		.map(|(key, value)| (key.clone(), value.clone()))
		.collect();

	if let Some(environment) = &options.environment {
		data.entry("environment")
			.or_insert_with(|| serde_json::Value::String(environment.clone()));
	}

	serde_json::Value::Object(data)
}

/// Whether `marker` lexes as a single identifier token.
fn is_identifier(marker: &str) -> bool {
	let mut chars = marker.chars();
	chars
		.next()
		.is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
		&& chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}
