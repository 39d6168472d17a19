use assert_cmd::Command;

pub fn htmlproc_cmd() -> Command {
	let mut cmd = Command::cargo_bin("htmlproc").unwrap_or_else(|e| panic!("cargo_bin: {e}"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}
