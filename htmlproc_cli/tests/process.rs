mod common;

use clap::Parser;
use htmlproc_cli::HtmlProcCli;
use htmlproc_cli::parse_key_value;
use htmlproc_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use rstest::rstest;
use serde_json::json;

const PAGE: &str = "<h1>${title}</h1>\n<!-- build:remove(dev) -->\n<p>dev</p>\n<!-- /build \
                    -->\n<!-- build:remove(dist) -->\n<p>dist</p>\n<!-- /build -->\n";

#[rstest]
#[case::dev("dev", "<h1>${title}</h1>\n<p>dev</p>\n<!-- build:remove(dist) -->\n<!-- /build -->\n")]
#[case::dist("dist", "<h1>${title}</h1>\n<!-- build:remove(dev) -->\n<!-- /build -->\n<p>dist</p>\n")]
fn prints_processed_file(#[case] env: &str, #[case] expected: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("index.html"), PAGE)?;

	let mut cmd = common::htmlproc_cmd();
	cmd.current_dir(tmp.path())
		.arg("--env")
		.arg(env)
		.arg("index.html")
		.assert()
		.success()
		.stdout(expected.to_string());

	Ok(())
}

#[test]
fn strip_and_set_values() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("index.html"), PAGE)?;

	let mut cmd = common::htmlproc_cmd();
	cmd.current_dir(tmp.path())
		.args(["--env", "dist", "--strip", "--set", "title=Home", "index.html"])
		.assert()
		.success()
		.stdout("<h1>Home</h1>\n<p>dist</p>\n");

	Ok(())
}

#[test]
fn config_file_supplies_options() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("index.html"), PAGE)?;
	std::fs::write(tmp.path().join("site.json"), r#"{ "title": "From data" }"#)?;
	std::fs::write(
		tmp.path().join("htmlproc.toml"),
		"environment = \"dev\"\nstrip = true\n\n[data]\nsite = \"site.json\"\n",
	)?;
	std::fs::write(tmp.path().join("title.html"), "<h1>${site.title}</h1>\n")?;

	let mut cmd = common::htmlproc_cmd();
	cmd.current_dir(tmp.path())
		.arg("title.html")
		.assert()
		.success()
		.stdout("<h1>From data</h1>\n");

	let mut cmd = common::htmlproc_cmd();
	cmd.current_dir(tmp.path())
		.args(["--env", "dist", "index.html"])
		.assert()
		.success()
		.stdout(predicates::str::contains("<p>dist</p>").and(predicates::str::contains("<p>dev</p>").not()));

	Ok(())
}

#[test]
fn explicit_config_path() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("config"))?;
	std::fs::write(tmp.path().join("index.html"), "<p>${greeting}</p>\n")?;
	std::fs::write(
		tmp.path().join("config/custom.toml"),
		"[variables]\ngreeting = \"hello\"\n",
	)?;

	let mut cmd = common::htmlproc_cmd();
	cmd.current_dir(tmp.path())
		.args(["--config", "config/custom.toml", "index.html"])
		.assert()
		.success()
		.stdout("<p>hello</p>\n");

	Ok(())
}

#[test]
fn out_dir_receives_every_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let names = ["a.html", "b.html", "c.html"];
	for name in names {
		std::fs::write(
			tmp.path().join(name),
			format!("<!-- build:remove(dist) --><p>{name}</p><!-- /build -->"),
		)?;
	}

	let mut cmd = common::htmlproc_cmd();
	cmd.current_dir(tmp.path())
		.args(["--env", "dist", "--out-dir", "dist"])
		.args(names)
		.assert()
		.success()
		.stdout(predicates::str::contains("3 file(s)"));

	for name in names {
		let output = std::fs::read_to_string(tmp.path().join("dist").join(name))?;
		assert_eq!(output, format!("<p>{name}</p>"));
	}

	Ok(())
}

#[test]
fn out_dir_keeps_input_directories() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	for dir in ["a", "b"] {
		std::fs::create_dir_all(tmp.path().join(dir))?;
		std::fs::write(tmp.path().join(dir).join("index.html"), format!("<p>{dir}</p>"))?;
	}

	let mut cmd = common::htmlproc_cmd();
	cmd.current_dir(tmp.path())
		.args(["a/index.html", "b/index.html", "--out-dir", "dist"])
		.assert()
		.success()
		.stdout(predicates::str::contains("2 file(s)"));

	for dir in ["a", "b"] {
		let output = std::fs::read_to_string(tmp.path().join("dist").join(dir).join("index.html"))?;
		assert_eq!(output, format!("<p>{dir}</p>"));
	}

	Ok(())
}

#[test]
fn out_dir_rejects_colliding_targets() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("other"))?;
	std::fs::write(tmp.path().join("index.html"), "<p>root</p>")?;
	std::fs::write(tmp.path().join("other/index.html"), "<p>other</p>")?;

	let mut cmd = common::htmlproc_cmd();
	cmd.current_dir(tmp.path())
		.arg("index.html")
		.arg(tmp.path().join("other/index.html"))
		.args(["--out-dir", "dist"])
		.assert()
		.code(2)
		.stderr(predicates::str::contains("would both be written to"));

	assert!(!tmp.path().join("dist").exists());

	Ok(())
}

#[test]
fn recursive_include_and_custom_block() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("partials"))?;
	std::fs::write(
		tmp.path().join("index.html"),
		"<!-- build:include partials/header.html -->\n<!-- /build -->\n",
	)?;
	std::fs::write(
		tmp.path().join("partials/header.html"),
		"<!-- build:badge beta -->\n<!-- /build -->\n",
	)?;
	std::fs::write(
		tmp.path().join("blocks.json"),
		r#"{ "blocks": [{ "name": "badge", "template": "<span class=\"badge\">{{ params }}</span>" }] }"#,
	)?;

	let mut cmd = common::htmlproc_cmd();
	cmd.current_dir(tmp.path())
		.args(["--recursive", "--custom-block", "blocks.json", "index.html"])
		.assert()
		.success()
		.stdout("<span class=\"badge\">beta</span>\n");

	Ok(())
}

#[test]
fn unterminated_block_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("broken.html"), "<p>\n<!-- build:remove(dev) -->\n")?;

	let mut cmd = common::htmlproc_cmd();
	cmd.current_dir(tmp.path())
		.arg("broken.html")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("unterminated").and(predicates::str::contains("line 2")));

	Ok(())
}

#[test]
fn missing_input_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	let mut cmd = common::htmlproc_cmd();
	cmd.current_dir(tmp.path())
		.arg("missing.html")
		.assert()
		.code(2);

	Ok(())
}

#[test]
fn requires_files() {
	assert!(HtmlProcCli::try_parse_from(["htmlproc"]).is_err());
}

#[test]
fn parses_flags() -> AnyEmptyResult {
	let cli = HtmlProcCli::try_parse_from([
		"htmlproc",
		"-e",
		"dist",
		"--marker",
		"process",
		"--strip",
		"--set",
		"count=3",
		"--set",
		"name=site",
		"a.html",
		"b.html",
	])?;

	assert_eq!(cli.env.as_deref(), Some("dist"));
	assert_eq!(cli.marker.as_deref(), Some("process"));
	assert!(cli.strip);
	assert!(!cli.recursive);
	assert_eq!(cli.files.len(), 2);
	assert_eq!(cli.variables, vec![
		("count".to_string(), json!(3)),
		("name".to_string(), json!("site")),
	]);

	Ok(())
}

#[rstest]
#[case::string("title=Home", "title", json!("Home"))]
#[case::number("count=3", "count", json!(3))]
#[case::json_object(r#"site={"a":true}"#, "site", json!({ "a": true }))]
#[case::value_with_equals("query=a=b", "query", json!("a=b"))]
#[case::empty_value("empty=", "empty", json!(""))]
fn parses_key_values(#[case] raw: &str, #[case] key: &str, #[case] value: serde_json::Value) -> AnyEmptyResult {
	assert_eq!(parse_key_value(raw)?, (key.to_string(), value));

	Ok(())
}

#[rstest]
#[case::no_separator("title")]
#[case::empty_key("=value")]
fn rejects_invalid_key_values(#[case] raw: &str) {
	assert!(parse_key_value(raw).is_err());
}
