use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

use super::HtmlProcError;
use super::HtmlProcResult;
use crate::BlockRegistry;
use crate::Position;
use crate::environment::parse_targets;
use crate::lexer::OpenTag;
use crate::lexer::TagKind;
use crate::lexer::tokenize;
use crate::position::LineTable;

/// One unit of scanned source: literal text or a complete directive.
///
/// Concatenating the resolved spans in order yields the output before
/// interpolation.
#[derive(Debug, Clone, PartialEq)]
pub enum Span<'a> {
	Text(&'a str),
	Directive(Directive),
}

/// A matched `build:<type>(...) ... /build` region.
///
/// ```html
/// <!-- build:remove(dev|staging) -->
/// <script src="debug.js"></script>
/// <!-- /build -->
/// ```
///
/// When both markers stand alone on their lines the directive is in *line
/// mode*: [`opening`](Directive::opening) and [`closing`](Directive::closing)
/// hold the complete marker lines and the directive replaces whole lines, so
/// removing it leaves no blank line behind. Otherwise it covers exactly the
/// comment bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
	/// The block type after the marker, e.g. `remove`, `include`, `ie`.
	pub block_type: String,
	/// Environments this block is gated on. Empty when none were declared.
	pub targets: Vec<String>,
	/// Whether activation depends on the requested environment.
	pub gated: bool,
	/// Parameter string: the parenthesised arguments or the trailing value.
	pub params: String,
	/// The content between the opening and closing markers, verbatim.
	pub body: String,
	/// Raw opening marker text.
	pub opening: String,
	/// Raw closing marker text.
	pub closing: String,
	/// Leading whitespace of the opening marker line (line mode only).
	pub indent: String,
	/// Whether the directive replaces whole lines.
	pub line_mode: bool,
	/// 1-indexed line of the opening marker.
	pub start_line: usize,
	/// 1-indexed line of the closing marker.
	pub end_line: usize,
	/// The region of the source this directive replaces.
	pub position: Position,
}

impl Directive {
	/// The body split into lines, without line terminators.
	pub fn body_lines(&self) -> Vec<&str> {
		self.body.lines().collect()
	}

	/// The byte range of the source this directive replaces.
	pub fn span(&self) -> Range<usize> {
		self.position.start.offset..self.position.end.offset
	}

	/// Line terminator to restore after generated content.
	pub fn line_ending(&self) -> &str {
		if !self.line_mode {
			""
		} else if self.closing.ends_with("\r\n") {
			"\r\n"
		} else if self.closing.ends_with('\n') {
			"\n"
		} else {
			""
		}
	}

	/// Shape generated content so it sits where the directive was: in line
	/// mode every non-empty line receives the directive's indent and the line
	/// ending is restored. Trailing newlines of `content` are dropped in both
	/// modes.
	pub fn place(&self, content: &str) -> String {
		let content = content.trim_end_matches(['\n', '\r']);

		if !self.line_mode {
			return content.to_string();
		}

		let indented = content
			.lines()
			.map(|line| {
				if line.is_empty() {
					String::new()
				} else {
					format!("{}{line}", self.indent)
				}
			})
			.collect::<Vec<_>>()
			.join("\n");

		format!("{indented}{}", self.line_ending())
	}

	/// The opening and closing markers without the body, used for inactive
	/// blocks that are not stripped.
	pub fn markers(&self) -> String {
		format!("{}{}", self.opening, self.closing)
	}
}

/// Scan `content` for directives written with `marker` and split it into
/// spans.
///
/// Blocks nest: a closing marker closes the innermost open block, and only
/// outermost blocks become spans. Nested blocks stay in the body and are
/// scanned again when a handler expands that body. A closing marker with no
/// open block is left as text. An open block without a closing marker is an
/// [`HtmlProcError::UnterminatedBlock`].
pub fn scan<'a>(
	content: &'a str,
	marker: &str,
	file: &str,
	registry: &BlockRegistry,
) -> HtmlProcResult<Vec<Span<'a>>> {
	let tags = tokenize(content, marker);
	let line_table = LineTable::new(content);
	let mut pending: Vec<(OpenTag, Range<usize>)> = vec![];
	let mut directives: Vec<Directive> = vec![];

	for tag in tags {
		match tag.kind {
			TagKind::Open(open) => pending.push((open, tag.range)),
			TagKind::Close => {
				let Some((open, open_range)) = pending.pop() else {
					let point = line_table.point(tag.range.start);
					tracing::warn!(file, line = point.line, "closing marker without an open block");
					continue;
				};

				if pending.is_empty() {
					let creator = DirectiveCreator {
						content,
						line_table: &line_table,
						registry,
					};
					directives.push(creator.create(open, &open_range, &tag.range));
				}
			}
		}
	}

	if let Some((open, range)) = pending.into_iter().next() {
		return Err(HtmlProcError::UnterminatedBlock {
			block_type: open.block_type,
			file: file.to_string(),
			line: line_table.point(range.start).line,
		});
	}

	let mut spans = Vec::with_capacity(directives.len() * 2 + 1);
	let mut cursor = 0;
	for directive in directives {
		let span = directive.span();
		if span.start > cursor {
			spans.push(Span::Text(&content[cursor..span.start]));
		}
		cursor = span.end;
		spans.push(Span::Directive(directive));
	}
	if cursor < content.len() {
		spans.push(Span::Text(&content[cursor..]));
	}

	tracing::trace!(file, spans = spans.len(), "scanned directives");

	Ok(spans)
}

struct DirectiveCreator<'c> {
	content: &'c str,
	line_table: &'c LineTable,
	registry: &'c BlockRegistry,
}

impl DirectiveCreator<'_> {
	fn create(&self, open: OpenTag, open_range: &Range<usize>, close_range: &Range<usize>) -> Directive {
		let content = self.content;
		let standalone = (
			standalone_line(content, open_range),
			standalone_line(content, close_range),
		);

		let (span, opening, closing, body, indent, line_mode) = match standalone {
			(Some(open_line), Some(close_line)) if open_line.end <= close_line.start => {
				(
					open_line.start..close_line.end,
					&content[open_line.clone()],
					&content[close_line.clone()],
					&content[open_line.end..close_line.start],
					&content[open_line.start..open_range.start],
					true,
				)
			}
			_ => {
				(
					open_range.start..close_range.end,
					&content[open_range.clone()],
					&content[close_range.clone()],
					&content[open_range.end..close_range.start],
					"",
					false,
				)
			}
		};

		let (targets, gated, params) = self.resolve_arguments(&open);

		Directive {
			block_type: open.block_type,
			targets,
			gated,
			params,
			body: body.to_string(),
			opening: opening.to_string(),
			closing: closing.to_string(),
			indent: indent.to_string(),
			line_mode,
			start_line: self.line_table.point(open_range.start).line,
			end_line: self.line_table.point(close_range.start).line,
			position: self.line_table.position(span.start, span.end),
		}
	}

	/// Split the tag arguments into targets and the parameter string.
	///
	/// - `type:targets ...` declares targets explicitly.
	/// - `type(targets) value` declares targets in the parentheses.
	/// - Otherwise the parameter is the parenthesised text or the value, and a
	///   gated block type reads its targets from it.
	fn resolve_arguments(&self, open: &OpenTag) -> (Vec<String>, bool, String) {
		let type_gated = self.registry.is_gated(&open.block_type);

		match (&open.targets, &open.args, &open.value) {
			(Some(targets), args, value) => {
				let params = args.as_deref().or(value.as_deref()).unwrap_or_default();
				(parse_targets(targets), true, unquote(params))
			}
			(None, Some(args), Some(value)) => (parse_targets(args), true, unquote(value)),
			(None, args, value) => {
				let params = unquote(args.as_deref().or(value.as_deref()).unwrap_or_default());
				let targets = if type_gated {
					parse_targets(&params)
				} else {
					vec![]
				};
				(targets, type_gated, params)
			}
		}
	}
}

/// The full line range (including its terminator) of a comment that is the
/// only thing on its line, or `None`.
fn standalone_line(content: &str, range: &Range<usize>) -> Option<Range<usize>> {
	let line_start = content[..range.start].rfind('\n').map_or(0, |idx| idx + 1);
	if !content[line_start..range.start]
		.chars()
		.all(|ch| ch == ' ' || ch == '\t')
	{
		return None;
	}

	let rest = &content[range.end..];
	let newline = rest.find('\n');
	let tail = &rest[..newline.unwrap_or(rest.len())];
	if !tail.trim().is_empty() {
		return None;
	}

	let line_end = newline.map_or(content.len(), |idx| range.end + idx + 1);
	Some(line_start..line_end)
}

/// Strip surrounding quotes from a parameter and unescape it.
fn unquote(params: &str) -> String {
	let params = params.trim();
	let quoted = params.len() >= 2
		&& ((params.starts_with('"') && params.ends_with('"'))
			|| (params.starts_with('\'') && params.ends_with('\'')));

	if quoted {
		snailquote::unescape(params).unwrap_or_else(|_| params[1..params.len() - 1].to_string())
	} else {
		params.to_string()
	}
}
