//! Built-in block handlers.

use super::HtmlProcResult;
use crate::Directive;
use crate::ProcessingContext;
use crate::include::read_asset;

/// `remove`: keep the body, expanding any directives nested in it. Whether
/// the block survives at all is decided by the environment gate.
pub(crate) fn remove(directive: &Directive, context: &ProcessingContext<'_>) -> HtmlProcResult<String> {
	context.expand(&directive.body)
}

/// `include`: insert another file.
pub(crate) fn include(directive: &Directive, context: &ProcessingContext<'_>) -> HtmlProcResult<String> {
	crate::include::include(directive, context)
}

/// `ie`: wrap the expanded body in a conditional comment.
pub(crate) fn ie(directive: &Directive, context: &ProcessingContext<'_>) -> HtmlProcResult<String> {
	let condition = if directive.params.is_empty() {
		"IE"
	} else {
		directive.params.as_str()
	};
	let body = context.expand(&directive.body)?;

	if directive.line_mode {
		let indent = &directive.indent;
		return Ok(format!(
			"{indent}<!--[if {condition}]>\n{body}{indent}<![endif]-->{}",
			directive.line_ending()
		));
	}

	Ok(format!("<!--[if {condition}]>{body}<![endif]-->"))
}

/// `js`: `app.js` becomes a script tag, `inline app.js` inlines the file.
pub(crate) fn js(directive: &Directive, context: &ProcessingContext<'_>) -> HtmlProcResult<String> {
	asset(directive, context, Asset::Script)
}

/// `css`: `app.css` becomes a stylesheet link, `inline app.css` inlines the
/// file.
pub(crate) fn css(directive: &Directive, context: &ProcessingContext<'_>) -> HtmlProcResult<String> {
	asset(directive, context, Asset::Style)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Asset {
	Script,
	Style,
}

impl Asset {
	/// Tag referencing an external file.
	fn link(self, path: &str) -> String {
		match self {
			Self::Script => format!("<script src=\"{path}\"></script>"),
			Self::Style => format!("<link rel=\"stylesheet\" href=\"{path}\">"),
		}
	}

	/// Tag wrapping inline content.
	pub(crate) fn wrap(self, content: &str) -> String {
		let content = content.trim_end_matches(['\n', '\r']);
		match self {
			Self::Script => format!("<script>\n{content}\n</script>"),
			Self::Style => format!("<style>\n{content}\n</style>"),
		}
	}
}

fn asset(directive: &Directive, context: &ProcessingContext<'_>, kind: Asset) -> HtmlProcResult<String> {
	let params = directive.params.trim();

	if params.is_empty() {
		tracing::warn!(
			block_type = %directive.block_type,
			file = %context.file_label(),
			line = directive.start_line,
			"asset block without a path, keeping its body"
		);
		return context.expand(&directive.body);
	}

	if let Some(path) = params.strip_prefix("inline ") {
		let content = read_asset(directive, context, path.trim())?;
		return Ok(directive.place(&kind.wrap(&content)));
	}

	Ok(directive.place(&kind.link(params)))
}

