use std::borrow::Cow;

use minijinja::Environment;
use minijinja::HtmlEscape;
use minijinja::UndefinedBehavior;
use minijinja::Value;
use regex::Captures;
use regex::Regex;

use super::HtmlProcError;
use super::HtmlProcResult;
use crate::TemplateSettings;

/// The default interpolation delimiter: `${expression}`.
pub const DEFAULT_INTERPOLATE_PATTERN: &str = r"\$\{([\s\S]+?)\}";

/// The final pass that replaces `${expression}` placeholders with values
/// from the data mapping.
///
/// Expressions are `minijinja` expressions, so attribute paths
/// (`site.title`), indexing (`items[0]`), operators and filters
/// (`name|upper`) all work. Unresolvable placeholders stay as written unless
/// the interpolator is strict.
#[derive(Debug, Clone)]
pub struct Interpolator {
	pattern: Regex,
	/// Number of capture groups contributed by the escape pattern.
	escape_groups: Option<usize>,
	strict: bool,
}

impl Interpolator {
	pub fn new(settings: &TemplateSettings) -> HtmlProcResult<Self> {
		let interpolate = settings
			.interpolate
			.as_deref()
			.unwrap_or(DEFAULT_INTERPOLATE_PATTERN);
		let (interpolate_regex, interpolate) = compile(interpolate)?;

		let (pattern, escape_groups) = match settings.escape.as_deref() {
			Some(escape) => {
				let (escape_regex, escape) = compile(escape)?;
				let combined = format!("(?:{escape})|(?:{interpolate})");
				let (pattern, _) = compile(&combined)?;
				(pattern, Some(escape_regex.captures_len() - 1))
			}
			None => (interpolate_regex, None),
		};

		Ok(Self {
			pattern,
			escape_groups,
			strict: settings.strict,
		})
	}

	pub fn is_strict(&self) -> bool {
		self.strict
	}

	/// Replace every placeholder in `content`. `file` names the source in
	/// errors and logs.
	pub fn render(&self, content: &str, data: &serde_json::Value, file: &str) -> HtmlProcResult<String> {
		let mut env = Environment::new();
		env.set_undefined_behavior(UndefinedBehavior::Chainable);
		let ctx = Value::from_serialize(data);

		let mut output = String::with_capacity(content.len());
		let mut cursor = 0;
		let mut replaced = 0usize;

		for captures in self.pattern.captures_iter(content) {
			let Some(whole) = captures.get(0) else {
				continue;
			};
			let Some((expression, escape)) = self.expression(&captures) else {
				continue;
			};

			output.push_str(&content[cursor..whole.start()]);
			cursor = whole.end();

			match evaluate(&env, expression, &ctx) {
				Ok(Some(value)) if escape => {
					output.push_str(&HtmlEscape(&value).to_string());
					replaced += 1;
				}
				Ok(Some(value)) => {
					output.push_str(&value);
					replaced += 1;
				}
				Ok(None) | Err(_) if !self.strict => {
					tracing::warn!(file, expression, "unresolved interpolation left as written");
					output.push_str(whole.as_str());
				}
				Ok(None) => {
					return Err(HtmlProcError::Interpolation {
						expression: expression.trim().to_string(),
						file: file.to_string(),
						reason: "value is undefined".to_string(),
					});
				}
				Err(reason) => {
					return Err(HtmlProcError::Interpolation {
						expression: expression.trim().to_string(),
						file: file.to_string(),
						reason,
					});
				}
			}
		}

		output.push_str(&content[cursor..]);
		tracing::debug!(file, replaced, "interpolated placeholders");

		Ok(output)
	}

	/// The captured expression and whether it came from the escape pattern.
	fn expression<'c>(&self, captures: &Captures<'c>) -> Option<(&'c str, bool)> {
		match self.escape_groups {
			Some(escape_groups) => {
				if let Some(expression) = captures.get(1) {
					return Some((expression.as_str(), true));
				}
				captures
					.get(escape_groups + 1)
					.map(|expression| (expression.as_str(), false))
			}
			None => captures.get(1).map(|expression| (expression.as_str(), false)),
		}
	}
}

/// Compile `pattern` and return it with the source that was compiled. A
/// pattern that does not parse is retried with its literal braces escaped, so
/// `{{([\s\S]+?)}}` matches `{{ ... }}` as it would in JavaScript.
fn compile(pattern: &str) -> HtmlProcResult<(Regex, Cow<'_, str>)> {
	let (regex, source) = match Regex::new(pattern) {
		Ok(regex) => (regex, Cow::Borrowed(pattern)),
		Err(e) => {
			let escaped = escape_literal_braces(pattern);
			let regex = Regex::new(&escaped).map_err(|_| {
				HtmlProcError::InvalidPattern {
					pattern: pattern.to_string(),
					reason: e.to_string(),
				}
			})?;

			tracing::debug!(pattern, escaped = %escaped, "escaped literal braces in pattern");
			(regex, Cow::Owned(escaped))
		}
	};

	if regex.captures_len() < 2 {
		return Err(HtmlProcError::InvalidPattern {
			pattern: pattern.to_string(),
			reason: "the pattern has no capture group".to_string(),
		});
	}

	Ok((regex, source))
}

/// Escape every `{` and `}` that is not part of a `{n}`, `{n,}` or `{n,m}`
/// repetition following an expression.
fn escape_literal_braces(pattern: &str) -> String {
	let mut escaped = String::with_capacity(pattern.len() + 8);
	let mut chars = pattern.char_indices();

	while let Some((index, ch)) = chars.next() {
		match ch {
			'\\' => {
				escaped.push(ch);
				if let Some((_, next)) = chars.next() {
					escaped.push(next);
				}
			}
			'{' => {
				let follows_expression = !escaped.is_empty() && !escaped.ends_with(['(', '|']);
				match repetition_len(&pattern[index..]) {
					Some(len) if follows_expression => {
						escaped.push_str(&pattern[index..index + len]);
						// the repetition is ascii, one char per byte
						for _ in 1..len {
							chars.next();
						}
					}
					_ => escaped.push_str("\\{"),
				}
			}
			'}' => escaped.push_str("\\}"),
			_ => escaped.push(ch),
		}
	}

	escaped
}

/// Byte length of a repetition like `{2}` or `{1,3}` at the start of `rest`.
fn repetition_len(rest: &str) -> Option<usize> {
	let inner = rest.strip_prefix('{')?;
	let close = inner.find('}')?;
	let bounds = &inner[..close];
	let (min, max) = bounds.split_once(',').unwrap_or((bounds, ""));
	let valid = !min.is_empty()
		&& min.bytes().all(|byte| byte.is_ascii_digit())
		&& max.bytes().all(|byte| byte.is_ascii_digit());

	valid.then_some(close + 2)
}

/// Evaluate one expression. `Ok(None)` means the value is undefined.
fn evaluate<'s>(env: &Environment<'s>, expression: &'s str, ctx: &Value) -> Result<Option<String>, String> {
	let compiled = env
		.compile_expression(expression.trim())
		.map_err(|e| e.to_string())?;
	let value = compiled.eval(ctx).map_err(|e| e.to_string())?;

	if value.is_undefined() {
		return Ok(None);
	}

	if value.is_none() {
		return Ok(Some(String::new()));
	}

	Ok(Some(value.to_string()))
}
