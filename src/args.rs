use clap::{crate_version, App, Arg};
use graceful_exit::{self as exit, on_errf, with_errf};

pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
	Exit,
	OnErr,
	OnErrf,
	WithErr,
	WithErrf,
	Panic,
	Swallow,
	Ok,
}

const ACTIONS: &[&str] = &[
	"exit",
	"on-err",
	"on-errf",
	"with-err",
	"with-errf",
	"panic",
	"swallow",
	"ok",
];

#[derive(Debug)]
pub struct Args {
	pub code: i32,
	pub depth: usize,
	pub action: Action,
	pub message: String,
	pub catch: bool,
	pub run: bool,
}

/// Parse the command line. Bad values are reported through the exit helpers,
/// so a catcher must already be installed.
pub fn collect() -> Args {
	let matches = App::new("Exit Demo")
		.version(crate_version!())
		.author("Lewis B. <gitlab.io/lewisbelcher>")
		.about("Signals an exit from a nested call stack and shows which cleanups run.")
		.arg(
			Arg::with_name("code")
				.short("c")
				.long("code")
				.value_name("N")
				.help("Exit code to signal")
				.takes_value(true)
				.allow_hyphen_values(true),
		)
		.arg(
			Arg::with_name("depth")
				.short("d")
				.long("depth")
				.value_name("N")
				.help("Number of nested frames, each holding a cleanup guard")
				.takes_value(true),
		)
		.arg(
			Arg::with_name("action")
				.short("a")
				.long("action")
				.value_name("ACTION")
				.help("What to do at the bottom of the stack")
				.possible_values(ACTIONS)
				.takes_value(true),
		)
		.arg(
			Arg::with_name("message")
				.short("m")
				.long("message")
				.value_name("TEXT")
				.help("Error text used by the reporting actions")
				.takes_value(true),
		)
		.arg(
			Arg::with_name("no-catch")
				.long("no-catch")
				.help("Do not install the exit catcher"),
		)
		.arg(
			Arg::with_name("run")
				.long("run")
				.help("Use the closure entry point instead of the guard")
				.conflicts_with("no-catch"),
		)
		.get_matches();

	Args {
		code: parse_code(matches.value_of("code")),
		depth: parse_depth(matches.value_of("depth")),
		action: parse_action(matches.value_of("action")),
		message: matches.value_of("message").unwrap_or("boom").to_string(),
		catch: !matches.is_present("no-catch"),
		run: matches.is_present("run"),
	}
}

fn parse_code(value: Option<&str>) -> i32 {
	let value = match value {
		Some(value) => value,
		None => return exit::SUCCESS.get(),
	};
	on_errf!(
		value.parse::<i32>(),
		"invalid integer for option '--code': {}",
		value
	)
}

fn parse_depth(value: Option<&str>) -> usize {
	let value = value.unwrap_or("3");
	let depth = on_errf!(
		value.parse::<usize>(),
		"invalid integer for option '--depth': {}",
		value
	);
	if depth > MAX_DEPTH {
		with_errf!("option '--depth' must be <={}", MAX_DEPTH);
	}
	depth
}

fn parse_action(value: Option<&str>) -> Action {
	match value.unwrap_or("exit") {
		"exit" => Action::Exit,
		"on-err" => Action::OnErr,
		"on-errf" => Action::OnErrf,
		"with-err" => Action::WithErr,
		"with-errf" => Action::WithErrf,
		"panic" => Action::Panic,
		"swallow" => Action::Swallow,
		"ok" => Action::Ok,
		other => exit::with_err(format!("unknown action '{}'", other)),
	}
}
