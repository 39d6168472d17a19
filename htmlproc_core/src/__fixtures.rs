use std::path::Path;

use rstest::fixture;
use tempfile::TempDir;

use crate::ProcessOptions;

/// Two sibling `remove` blocks written inline.
pub const SCENARIO_HTML: &str = "<!--build:remove(dev) --> VISIBLE <!--endbuild--> \
                                 <!--build:remove(prod) --> HIDDEN <!--endbuild-->";

/// A page with environment-gated sections and a message placeholder.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>${message}</title>
  <!-- build:css:dist styles/app.min.css -->
  <link rel="stylesheet" href="styles/a.css">
  <link rel="stylesheet" href="styles/b.css">
  <!-- /build -->
</head>
<body>
  <!-- build:remove(dev) -->
  <p class="debug">debug panel</p>
  <!-- /build -->
  <!-- build:js:dist app.min.js -->
  <script src="a.js"></script>
  <script src="b.js"></script>
  <!-- /build -->
</body>
</html>
"#;

pub const INDEX_DEV_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>This is dev target</title>
  <!-- build:css:dist styles/app.min.css -->
  <!-- /build -->
</head>
<body>
  <p class="debug">debug panel</p>
  <!-- build:js:dist app.min.js -->
  <!-- /build -->
</body>
</html>
"#;

pub const INDEX_DIST_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>This is dist target</title>
  <link rel="stylesheet" href="styles/app.min.css">
</head>
<body>
  <script src="app.min.js"></script>
</body>
</html>
"#;

/// Sibling blocks declaring several targets each.
pub const MULTIPLE_HTML: &str = "<!-- build:remove(mult_one|mult_two) -->\n<p>one or \
                                 two</p>\n<!-- /build -->\n<!-- build:remove(mult_three) \
                                 -->\n<p>three</p>\n<!-- /build -->\n";

pub fn options(environment: &str) -> ProcessOptions {
	ProcessOptions::default().with_environment(environment)
}

pub fn stripped(environment: &str) -> ProcessOptions {
	ProcessOptions {
		strip: true,
		..options(environment)
	}
}

/// Write `content` to `name` inside `dir`, creating parent directories.
pub fn write(dir: &Path, name: &str, content: &str) {
	let path = dir.join(name);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}

#[fixture]
pub fn tmp() -> TempDir {
	tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"))
}
