use crate::Directive;

/// Parse a comma- or pipe-separated target list. Entries are trimmed and
/// empty entries dropped.
pub fn parse_targets(raw: &str) -> Vec<String> {
	raw.split([',', '|'])
		.map(str::trim)
		.filter(|target| !target.is_empty())
		.map(ToString::to_string)
		.collect()
}

/// Whether a gated block with `targets` is active for `environment`.
///
/// A block with targets is active when the environment is one of them. A
/// block without targets is active only when no environment was requested.
pub fn is_active(targets: &[String], environment: Option<&str>) -> bool {
	match environment {
		Some(environment) => targets.iter().any(|target| target == environment),
		None => targets.is_empty(),
	}
}

/// Tracks a run of sibling gated directives of the same block type so that
/// only the first active one is emitted.
///
/// ```html
/// <!-- build:remove(dev) --><p>debug</p><!-- /build -->
/// <!-- build:remove(dev|prod) --><p>fallback</p><!-- /build -->
/// ```
///
/// With `environment = "dev"` only the first block survives.
#[derive(Debug, Default)]
pub struct SwitchGroup {
	block_type: Option<String>,
	matched: bool,
}

impl SwitchGroup {
	/// Decide whether `directive` should be emitted and record the outcome
	/// for its following siblings.
	pub fn admit(&mut self, directive: &Directive, environment: Option<&str>) -> bool {
		if !directive.gated {
			self.reset();
			return true;
		}

		if self.block_type.as_deref() != Some(directive.block_type.as_str()) {
			self.block_type = Some(directive.block_type.clone());
			self.matched = false;
		}

		if self.matched {
			tracing::trace!(
				block_type = %directive.block_type,
				line = directive.start_line,
				"sibling already matched"
			);
			return false;
		}

		let active = is_active(&directive.targets, environment);
		self.matched = active;
		active
	}

	/// End the current sibling group. Called when non-whitespace text
	/// separates two directives.
	pub fn reset(&mut self) {
		self.block_type = None;
		self.matched = false;
	}
}
