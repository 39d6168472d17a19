use std::ops::Range;

use logos::Logos;

/// Raw tokens produced by logos for flat tokenization of a single HTML
/// comment.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
	#[token("<!--")]
	HtmlCommentOpen,
	#[token("-->")]
	HtmlCommentClose,
	#[token(":")]
	Colon,
	#[token("/")]
	Slash,
	#[token("(")]
	ParenOpen,
	#[token(")")]
	ParenClose,
	#[token("\n")]
	Newline,
	#[regex(r"[ \t\r]+")]
	Whitespace,
	#[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
	Ident,
}

/// The opening marker of a directive, e.g. `<!-- build:remove(dev) -->`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenTag {
	pub block_type: String,
	/// Text after a second colon: `build:remove:dist,dev`.
	pub targets: Option<String>,
	/// Text between the parentheses: `build:ie(lt IE 9)`.
	pub args: Option<String>,
	/// Free text before the comment close: `build:js app.js`.
	pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TagKind {
	Open(OpenTag),
	Close,
}

/// A directive marker together with the byte range of its comment in the
/// source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tag {
	pub kind: TagKind,
	pub range: Range<usize>,
}

/// Walks the logos token stream of one comment and decides whether it is a
/// directive marker for `marker`.
struct TagWalker<'a> {
	/// The comment text, `<!--` through `-->`.
	source: &'a str,
	/// The collected raw tokens and their byte spans within `source`.
	raw_tokens: Vec<(Result<RawToken, ()>, Range<usize>)>,
	/// Current index into `raw_tokens`.
	cursor: usize,
	marker: &'a str,
}

impl<'a> TagWalker<'a> {
	fn new(source: &'a str, marker: &'a str) -> Self {
		let raw_tokens: Vec<_> = RawToken::lexer(source).spanned().collect();

		Self {
			source,
			raw_tokens,
			cursor: 0,
			marker,
		}
	}

	fn peek(&self) -> Option<Result<RawToken, ()>> {
		self.raw_tokens.get(self.cursor).map(|(token, _)| *token)
	}

	/// Start offset of the current token, or the end of the comment.
	fn offset(&self) -> usize {
		self.raw_tokens
			.get(self.cursor)
			.map_or(self.source.len(), |(_, span)| span.start)
	}

	fn current_slice(&self) -> &'a str {
		let (_, span) = &self.raw_tokens[self.cursor];
		&self.source[span.clone()]
	}

	fn skip_whitespace(&mut self) {
		while let Some(Ok(RawToken::Whitespace | RawToken::Newline)) = self.peek() {
			self.cursor += 1;
		}
	}

	/// Consume an identifier token equal to `expected`.
	fn eat_ident(&mut self, expected: &str) -> bool {
		if self.peek() == Some(Ok(RawToken::Ident)) && self.current_slice() == expected {
			self.cursor += 1;
			return true;
		}
		false
	}

	fn eat(&mut self, token: RawToken) -> bool {
		if self.peek() == Some(Ok(token)) {
			self.cursor += 1;
			return true;
		}
		false
	}

	/// True when only whitespace remains before the closing `-->`.
	fn at_comment_close(&mut self) -> bool {
		self.skip_whitespace();
		self.peek() == Some(Ok(RawToken::HtmlCommentClose)) && self.cursor + 1 == self.raw_tokens.len()
	}

	fn process(mut self) -> Option<TagKind> {
		if !self.eat(RawToken::HtmlCommentOpen) {
			return None;
		}
		self.skip_whitespace();

		// `<!-- /build -->`
		if self.eat(RawToken::Slash) {
			self.skip_whitespace();
			let marker = self.marker;
			return (self.eat_ident(marker) && self.at_comment_close()).then_some(TagKind::Close);
		}

		// `<!-- endbuild -->`
		let end_marker = format!("end{}", self.marker);
		if self.eat_ident(&end_marker) {
			return self.at_comment_close().then_some(TagKind::Close);
		}

		let marker = self.marker;
		if !self.eat_ident(marker) || !self.eat(RawToken::Colon) {
			return None;
		}

		if self.peek() != Some(Ok(RawToken::Ident)) {
			return None;
		}
		let block_type = self.current_slice().to_string();
		self.cursor += 1;

		let targets = self.eat(RawToken::Colon).then(|| self.take_targets());
		let args = if self.peek() == Some(Ok(RawToken::ParenOpen)) {
			Some(self.take_parenthesized()?)
		} else {
			None
		};
		let value = self.take_value()?;

		Some(TagKind::Open(OpenTag {
			block_type,
			targets,
			args,
			value,
		}))
	}

	/// Everything up to whitespace, `(` or the comment close.
	fn take_targets(&mut self) -> String {
		let start = self.offset();
		while let Some(token) = self.peek() {
			if matches!(
				token,
				Ok(RawToken::Whitespace
					| RawToken::Newline
					| RawToken::ParenOpen
					| RawToken::HtmlCommentClose)
			) {
				break;
			}
			self.cursor += 1;
		}
		self.source[start..self.offset()].to_string()
	}

	/// The raw text between balanced parentheses. Returns `None` when the
	/// parentheses never close inside the comment.
	fn take_parenthesized(&mut self) -> Option<String> {
		self.cursor += 1;
		let start = self.offset();
		let mut depth = 1usize;

		while let Some(token) = self.peek() {
			match token {
				Ok(RawToken::ParenOpen) => depth += 1,
				Ok(RawToken::ParenClose) => {
					depth -= 1;
					if depth == 0 {
						let end = self.offset();
						self.cursor += 1;
						return Some(self.source[start..end].trim().to_string());
					}
				}
				Ok(RawToken::HtmlCommentClose) => return None,
				_ => {}
			}
			self.cursor += 1;
		}

		None
	}

	/// Trailing free text. The outer `Option` is `None` when the comment is
	/// malformed, the inner one when there is no value.
	#[allow(clippy::option_option)]
	fn take_value(&mut self) -> Option<Option<String>> {
		let start = self.offset();
		let close = self.raw_tokens.len().checked_sub(1)?;
		let (last, span) = &self.raw_tokens[close];
		if *last != Ok(RawToken::HtmlCommentClose) {
			return None;
		}

		let value = self.source[start..span.start].trim();
		Some((!value.is_empty()).then(|| value.to_string()))
	}
}

/// Extract the byte ranges of HTML comments (`<!-- ... -->`) from raw text.
///
/// When another `<!--` appears before the first `-->`, the innermost opener
/// wins. Conditional comments such as `<!--[if IE]>` therefore never swallow
/// a directive written inside them.
pub(crate) fn extract_html_comments(content: &str) -> Vec<Range<usize>> {
	let bytes = content.as_bytes();
	let open_marker = b"<!--";
	let close_marker = b"-->";
	let mut ranges = Vec::new();
	let mut search_from = 0;

	while search_from < bytes.len() {
		let Some(open_offset) = memstr(&bytes[search_from..], open_marker) else {
			break;
		};
		let mut abs_open = search_from + open_offset;
		let after_open = abs_open + open_marker.len();

		let Some(close_offset) = memstr(&bytes[after_open..], close_marker) else {
			break;
		};
		let abs_close = after_open + close_offset;

		while let Some(inner) = memstr(&bytes[abs_open + open_marker.len()..abs_close], open_marker)
		{
			abs_open += open_marker.len() + inner;
		}

		let end = abs_close + close_marker.len();
		ranges.push(abs_open..end);
		search_from = end;
	}

	ranges
}

/// Find every directive marker for `marker` in `content`, in source order.
pub(crate) fn tokenize(content: &str, marker: &str) -> Vec<Tag> {
	extract_html_comments(content)
		.into_iter()
		.filter_map(|range| {
			let walker = TagWalker::new(&content[range.clone()], marker);
			walker.process().map(|kind| Tag { kind, range })
		})
		.collect()
}

pub(crate) fn memstr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	haystack
		.windows(needle.len())
		.position(|window| window == needle)
}
