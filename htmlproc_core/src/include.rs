use std::path::Path;
use std::path::PathBuf;

use super::HtmlProcError;
use super::HtmlProcResult;
use crate::Directive;
use crate::ProcessingContext;
use crate::handlers::Asset;

/// How an included file is inserted, chosen by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
	/// `.html` and `.htm`: expanded when processing recursively.
	Html,
	/// `.js`: wrapped in a `<script>` tag.
	Script,
	/// `.css`: wrapped in a `<style>` tag.
	Style,
	/// Anything else: inserted as is.
	Raw,
}

impl IncludeKind {
	pub fn from_path(path: &Path) -> Self {
		let extension = path
			.extension()
			.and_then(|ext| ext.to_str())
			.map(str::to_ascii_lowercase);

		match extension.as_deref() {
			Some("html" | "htm") => Self::Html,
			Some("js") => Self::Script,
			Some("css") => Self::Style,
			_ => Self::Raw,
		}
	}
}

/// Render an `include` directive.
pub(crate) fn include(directive: &Directive, context: &ProcessingContext<'_>) -> HtmlProcResult<String> {
	let path = resolve(directive, context, &directive.params)?;
	let content = std::fs::read_to_string(&path)?;
	let kind = IncludeKind::from_path(&path);

	tracing::debug!(
		path = %path.display(),
		from = %context.file_label(),
		?kind,
		depth = context.depth(),
		"including file"
	);

	let inserted = match kind {
		IncludeKind::Html if context.options().recursive => context.enter(path)?.expand(&content)?,
		IncludeKind::Html | IncludeKind::Raw => content,
		IncludeKind::Script => Asset::Script.wrap(&content),
		IncludeKind::Style => Asset::Style.wrap(&content),
	};

	Ok(directive.place(&inserted))
}

/// Read a file referenced by an asset block relative to the current base
/// directory.
pub(crate) fn read_asset(
	directive: &Directive,
	context: &ProcessingContext<'_>,
	requested: &str,
) -> HtmlProcResult<String> {
	let path = resolve(directive, context, requested)?;
	Ok(std::fs::read_to_string(path)?)
}

/// Resolve `requested` against the context's base directory and
/// canonicalize it.
fn resolve(directive: &Directive, context: &ProcessingContext<'_>, requested: &str) -> HtmlProcResult<PathBuf> {
	let requested = requested.trim();
	let candidate = Path::new(requested);
	let candidate = if candidate.is_absolute() {
		candidate.to_path_buf()
	} else {
		context.base_dir().join(candidate)
	};

	if requested.is_empty() || !candidate.is_file() {
		return Err(HtmlProcError::IncludeNotFound {
			path: requested.to_string(),
			from: context.file_label(),
			line: directive.start_line,
		});
	}

	Ok(candidate.canonicalize()?)
}
