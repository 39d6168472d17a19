use std::path::Path;

use minijinja::Environment;
use minijinja::UndefinedBehavior;
use minijinja::context;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::HtmlProcError;
use super::HtmlProcResult;
use crate::BlockHandler;
use crate::Directive;
use crate::ProcessingContext;

/// The contents of a custom block definition file.
///
/// ```toml
/// [[blocks]]
/// name = "card"
/// template = """
/// <div class="card" title="{{ params }}">{{ body }}</div>
/// """
///
/// [[blocks]]
/// name = "analytics"
/// gated = true
/// template = "<script src=\"/analytics.js\"></script>"
/// ```
#[derive(Debug, Clone, Deserialize)]
struct DefinitionFile {
	#[serde(default)]
	blocks: Vec<TemplateBlock>,
}

/// A block type rendered from a `minijinja` template.
///
/// The template sees `body` (the expanded body), `params`, `targets`,
/// `block_type`, `indent`, `environment` and `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateBlock {
	name: String,
	template: String,
	/// Gate every block of this type on the environment, like `remove`.
	#[serde(default)]
	gated: bool,
}

impl TemplateBlock {
	pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			template: template.into(),
			gated: false,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn template(&self) -> &str {
		&self.template
	}

	pub fn gated(&self) -> bool {
		self.gated
	}

	fn environment(&self) -> Result<Environment<'_>, minijinja::Error> {
		let mut env = Environment::new();
		env.set_keep_trailing_newline(true);
		env.set_undefined_behavior(UndefinedBehavior::Chainable);
		env.add_template(&self.name, &self.template)?;
		Ok(env)
	}
}

impl BlockHandler for TemplateBlock {
	fn render(&self, directive: &Directive, context: &ProcessingContext<'_>) -> HtmlProcResult<String> {
		let body = context.expand(&directive.body)?;
		let render_error = |e: minijinja::Error| {
			HtmlProcError::TemplateRender {
				block_type: self.name.clone(),
				reason: e.to_string(),
			}
		};

		let env = self.environment().map_err(render_error)?;
		let template = env.get_template(&self.name).map_err(render_error)?;
		let rendered = template
			.render(context! {
				body => body,
				params => directive.params,
				targets => directive.targets,
				block_type => directive.block_type,
				indent => directive.indent,
				environment => context.environment(),
				data => minijinja::Value::from_serialize(context.data()),
			})
			.map_err(render_error)?;

		Ok(directive.place(&rendered))
	}
}

/// Load the block definitions in `path`. The format follows the extension:
/// `.toml`, `.json`, `.yaml` or `.yml`.
///
/// Every template is compiled up front so a syntax error surfaces before
/// any file is processed.
pub(crate) fn load_definitions(path: &Path) -> HtmlProcResult<Vec<TemplateBlock>> {
	let load_error = |reason: String| {
		HtmlProcError::CustomHandlerLoad {
			path: path.display().to_string(),
			reason,
		}
	};

	let content = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
	let format = path
		.extension()
		.and_then(|ext| ext.to_str())
		.unwrap_or("")
		.to_ascii_lowercase();

	let definitions: DefinitionFile = deserialize(&content, &format).map_err(load_error)?;

	if definitions.blocks.is_empty() {
		return Err(load_error("no `blocks` are defined".to_string()));
	}

	for block in &definitions.blocks {
		if block.name.trim().is_empty() {
			return Err(load_error("a block has an empty `name`".to_string()));
		}

		block
			.environment()
			.map_err(|e| load_error(format!("block `{}`: {e}", block.name)))?;
	}

	Ok(definitions.blocks)
}

fn deserialize<T: DeserializeOwned>(content: &str, format: &str) -> Result<T, String> {
	match format {
		"toml" => toml::from_str(content).map_err(|e| e.to_string()),
		"json" => serde_json::from_str(content).map_err(|e| e.to_string()),
		"yaml" | "yml" => serde_yaml_ng::from_str(content).map_err(|e| e.to_string()),
		other => Err(format!("unsupported definition format `{other}`")),
	}
}
