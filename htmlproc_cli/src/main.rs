use std::collections::HashMap;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use htmlproc_cli::HtmlProcCli;
use htmlproc_core::AnyEmptyResult;
use htmlproc_core::AnyResult;
use htmlproc_core::HtmlProcError;
use htmlproc_core::HtmlProcResult;
use htmlproc_core::HtmlProcessor;
use owo_colors::OwoColorize;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = HtmlProcCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	if let Err(e) = run(&args) {
		// Render through miette for rich diagnostics with help text and
		// error codes.
		match e.downcast::<HtmlProcError>() {
			Ok(err) => {
				let report: miette::Report = (*err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.try_init()
		.ok();
}

fn run(args: &HtmlProcCli) -> AnyEmptyResult {
	let cwd = std::env::current_dir()?;
	let options = args.load_options(&cwd)?;
	let processor = Arc::new(HtmlProcessor::new(options)?);

	let targets = args
		.out_dir
		.as_deref()
		.map(|out_dir| output_targets(out_dir, &args.files))
		.transpose()?;

	let runtime = tokio::runtime::Builder::new_multi_thread().build()?;
	let outputs = runtime.block_on(process_files(processor, args.files.clone()))?;

	let (Some(out_dir), Some(targets)) = (&args.out_dir, targets) else {
		for (_, output) in outputs {
			print!("{output}");
		}
		return Ok(());
	};

	for ((path, output), target) in outputs.iter().zip(&targets) {
		if let Some(parent) = target.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(target, output)?;

		if args.verbose {
			eprintln!("  {} -> {}", path.display(), target.display());
		}
	}

	println!(
		"{} {} file(s) into {}",
		colored!("Wrote", green),
		outputs.len(),
		out_dir.display()
	);

	Ok(())
}

/// Where each input is written under `out_dir`. Relative inputs keep their
/// directories; absolute inputs and inputs leaving the working directory keep
/// only their file name. Two inputs mapping to the same target is an error.
fn output_targets(out_dir: &Path, files: &[PathBuf]) -> AnyResult<Vec<PathBuf>> {
	let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
	let mut targets = Vec::with_capacity(files.len());

	for path in files {
		let nested = path
			.components()
			.all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
		let target = if nested {
			out_dir.join(path)
		} else {
			out_dir.join(path.file_name().unwrap_or(path.as_os_str()))
		};

		if let Some(previous) = seen.insert(target.clone(), path) {
			return Err(format!(
				"`{}` and `{}` would both be written to `{}`",
				previous.display(),
				path.display(),
				target.display()
			)
			.into());
		}

		targets.push(target);
	}

	Ok(targets)
}

/// Process every file on the blocking pool. Results keep the input order and
/// the first failure aborts the remaining work.
async fn process_files(
	processor: Arc<HtmlProcessor>,
	files: Vec<PathBuf>,
) -> HtmlProcResult<Vec<(PathBuf, String)>> {
	let mut tasks = JoinSet::new();

	for (index, path) in files.into_iter().enumerate() {
		let processor = Arc::clone(&processor);
		tasks.spawn_blocking(move || {
			let output = processor.process_file(&path);
			(index, path, output)
		});
	}

	let mut results = Vec::with_capacity(tasks.len());
	while let Some(joined) = tasks.join_next().await {
		let (index, path, output) = joined.map_err(std::io::Error::other)?;

		match output {
			Ok(output) => results.push((index, path, output)),
			Err(e) => {
				tracing::debug!(file = %path.display(), "aborting remaining files");
				tasks.abort_all();
				return Err(e);
			}
		}
	}

	results.sort_by_key(|(index, ..)| *index);
	Ok(results
		.into_iter()
		.map(|(_, path, output)| (path, output))
		.collect())
}
