use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::HtmlProcError;
use super::HtmlProcResult;
use crate::Directive;
use crate::ProcessingContext;
use crate::custom::load_definitions;
use crate::handlers;

/// Renders an active directive into its replacement text.
pub trait BlockHandler: Send + Sync {
	fn render(&self, directive: &Directive, context: &ProcessingContext<'_>) -> HtmlProcResult<String>;
}

impl<F> BlockHandler for F
where
	F: Fn(&Directive, &ProcessingContext<'_>) -> HtmlProcResult<String> + Send + Sync,
{
	fn render(&self, directive: &Directive, context: &ProcessingContext<'_>) -> HtmlProcResult<String> {
		self(directive, context)
	}
}

/// Maps block type names to the handlers that render them.
///
/// A registry is fully populated before any scanning starts and is never
/// mutated while processing.
#[derive(Clone, Default)]
pub struct BlockRegistry {
	handlers: HashMap<String, Arc<dyn BlockHandler>>,
	/// Block types whose activation always depends on the environment.
	gated: HashSet<String>,
}

impl BlockRegistry {
	/// An empty registry without the built-in block types.
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry with `remove`, `include`, `ie`, `js` and `css`.
	pub fn with_builtins() -> Self {
		let mut registry = Self::new();
		registry
			.register_gated_fn("remove", handlers::remove)
			.register_fn("include", handlers::include)
			.register_fn("ie", handlers::ie)
			.register_fn("js", handlers::js)
			.register_fn("css", handlers::css);

		registry
	}

	/// Register a handler, replacing any existing handler for `block_type`.
	pub fn register(
		&mut self,
		block_type: impl Into<String>,
		handler: impl BlockHandler + 'static,
	) -> &mut Self {
		let block_type = block_type.into();
		self.gated.remove(&block_type);
		self.handlers.insert(block_type, Arc::new(handler));
		self
	}

	/// Register a handler whose blocks are always gated on the environment,
	/// like `remove`.
	pub fn register_gated(
		&mut self,
		block_type: impl Into<String>,
		handler: impl BlockHandler + 'static,
	) -> &mut Self {
		let block_type = block_type.into();
		self.gated.insert(block_type.clone());
		self.handlers.insert(block_type, Arc::new(handler));
		self
	}

	/// Register a closure or function as a handler.
	pub fn register_fn<F>(&mut self, block_type: impl Into<String>, handler: F) -> &mut Self
	where
		F: Fn(&Directive, &ProcessingContext<'_>) -> HtmlProcResult<String> + Send + Sync + 'static,
	{
		self.register(block_type, handler)
	}

	/// Register a closure or function as a gated handler.
	pub fn register_gated_fn<F>(&mut self, block_type: impl Into<String>, handler: F) -> &mut Self
	where
		F: Fn(&Directive, &ProcessingContext<'_>) -> HtmlProcResult<String> + Send + Sync + 'static,
	{
		self.register_gated(block_type, handler)
	}

	/// Load the block types defined in a definition file. Later definitions
	/// override earlier ones and the built-ins.
	pub fn load_custom(&mut self, path: &Path) -> HtmlProcResult<&mut Self> {
		for block in load_definitions(path)? {
			tracing::debug!(block_type = %block.name(), path = %path.display(), "registered custom block");
			let name = block.name().to_string();

			if block.gated() {
				self.register_gated(name, block);
			} else {
				self.register(name, block);
			}
		}

		Ok(self)
	}

	pub fn get(&self, block_type: &str) -> Option<&Arc<dyn BlockHandler>> {
		self.handlers.get(block_type)
	}

	/// The handler for `directive`, or [`HtmlProcError::UnknownBlockType`].
	pub fn resolve(&self, directive: &Directive, file: &str) -> HtmlProcResult<&dyn BlockHandler> {
		self.get(&directive.block_type)
			.map(|handler| &**handler)
			.ok_or_else(|| {
				HtmlProcError::UnknownBlockType {
					block_type: directive.block_type.clone(),
					file: file.to_string(),
					line: directive.start_line,
				}
			})
	}

	pub fn contains(&self, block_type: &str) -> bool {
		self.handlers.contains_key(block_type)
	}

	pub fn is_gated(&self, block_type: &str) -> bool {
		self.gated.contains(block_type)
	}

	/// Registered block type names, sorted.
	pub fn block_types(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}
}

impl fmt::Debug for BlockRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut gated: Vec<&str> = self.gated.iter().map(String::as_str).collect();
		gated.sort_unstable();

		f.debug_struct("BlockRegistry")
			.field("handlers", &self.block_types())
			.field("gated", &gated)
			.finish()
	}
}
