use std::path::Path;
use std::path::PathBuf;

use derive_more::Deref;

use super::HtmlProcError;
use super::HtmlProcResult;
use crate::BlockRegistry;
use crate::HtmlProcessor;
use crate::Interpolator;
use crate::ProcessOptions;

/// The chain of canonical file paths currently being expanded, outermost
/// first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct IncludeStack(Vec<PathBuf>);

impl IncludeStack {
	/// A copy of this stack with `path` pushed on top.
	pub fn extended(&self, path: PathBuf) -> Self {
		let mut paths = self.0.clone();
		paths.push(path);
		Self(paths)
	}

	/// Render the chain that re-enters `next`, e.g. `a.html -> b.html ->
	/// a.html`.
	pub fn chain(&self, next: &Path) -> String {
		self.iter()
			.map(|path| path.as_path())
			.chain(std::iter::once(next))
			.map(|path| path.display().to_string())
			.collect::<Vec<_>>()
			.join(" -> ")
	}
}

/// Everything a handler needs to render one directive.
///
/// A context is created once per top-level call. Recursive includes receive a
/// new child context with an extended include stack; contexts are never
/// mutated after creation.
#[derive(Debug, Clone)]
pub struct ProcessingContext<'p> {
	processor: &'p HtmlProcessor,
	file: Option<PathBuf>,
	base_dir: PathBuf,
	include_stack: IncludeStack,
	/// Number of includes between the processed source and this context.
	depth: usize,
}

impl<'p> ProcessingContext<'p> {
	pub(crate) fn root(processor: &'p HtmlProcessor, file: Option<PathBuf>, base_dir: PathBuf) -> Self {
		let include_stack = file
			.iter()
			.fold(IncludeStack::default(), |stack, path| stack.extended(path.clone()));

		Self {
			processor,
			file,
			base_dir,
			include_stack,
			depth: 0,
		}
	}

	/// A child context for expanding the file at `path`, which must be
	/// canonical.
	pub(crate) fn enter(&self, path: PathBuf) -> HtmlProcResult<Self> {
		if self.include_stack.contains(&path) {
			return Err(HtmlProcError::CircularInclude {
				chain: self.include_stack.chain(&path),
			});
		}

		let limit = self.options().max_include_depth;
		if self.depth >= limit {
			return Err(HtmlProcError::IncludeDepthExceeded {
				path: path.display().to_string(),
				limit,
			});
		}

		let base_dir = path
			.parent()
			.map_or_else(|| self.base_dir.clone(), Path::to_path_buf);

		Ok(Self {
			processor: self.processor,
			include_stack: self.include_stack.extended(path.clone()),
			file: Some(path),
			base_dir,
			depth: self.depth + 1,
		})
	}

	/// Expand every directive in `content` with this context. Interpolation
	/// is not applied.
	pub fn expand(&self, content: &str) -> HtmlProcResult<String> {
		crate::engine::expand(content, self)
	}

	pub fn options(&self) -> &'p ProcessOptions {
		self.processor.options()
	}

	pub fn registry(&self) -> &'p BlockRegistry {
		self.processor.registry()
	}

	pub fn interpolator(&self) -> &'p Interpolator {
		self.processor.interpolator()
	}

	/// The data mapping used for interpolation and custom templates.
	pub fn data(&self) -> &'p serde_json::Value {
		self.processor.data()
	}

	/// The requested environment, if any.
	pub fn environment(&self) -> Option<&'p str> {
		self.options().environment.as_deref()
	}

	/// The file being expanded. `None` for in-memory sources.
	pub fn file(&self) -> Option<&Path> {
		self.file.as_deref()
	}

	/// A printable name for the file being expanded.
	pub fn file_label(&self) -> String {
		self.file
			.as_ref()
			.map_or_else(|| "<input>".to_string(), |path| path.display().to_string())
	}

	/// The directory relative include paths resolve against.
	pub fn base_dir(&self) -> &Path {
		&self.base_dir
	}

	pub fn include_stack(&self) -> &IncludeStack {
		&self.include_stack
	}

	/// How many includes deep this context is. Zero for the processed
	/// source, whether it came from a file or a string.
	pub fn depth(&self) -> usize {
		self.depth
	}
}
