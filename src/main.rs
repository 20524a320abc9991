use graceful_exit::{self as exit, on_err, on_errf, with_errf};
use log::info;
use std::io::{self, Write};
use std::panic;
pub mod args;

use args::{Action, Args};

/// Prints `cleanup <name>` when dropped, making the unwind order visible.
struct Cleanup(String);

impl Drop for Cleanup {
	fn drop(&mut self) {
		let _ = writeln!(io::stdout().lock(), "cleanup {}", self.0);
	}
}

fn act(args: &Args) {
	let failed = Err::<(), _>(args.message.as_str());

	match args.action {
		Action::Exit => exit::with(args.code),
		Action::OnErr => on_err(failed),
		Action::OnErrf => on_errf!(failed, "prefix {}", 42),
		Action::WithErr => exit::with_err(&args.message),
		Action::WithErrf => with_errf!("{} {}", args.message, 42),
		Action::Panic => panic!("{}", args.message),
		Action::Swallow => {
			let code = args.code;
			let _ = panic::catch_unwind(move || -> () { exit::with(code) });
			panic!("{}", args.message)
		}
		Action::Ok => {
			on_err(Ok::<_, String>(()));
			on_errf!(Ok::<_, String>(()), "prefix {}", 42);
			println!("returned normally");
		}
	}
}

fn descend(level: usize, args: &Args) {
	if level > args.depth {
		return act(args);
	}
	let _cleanup = Cleanup(level.to_string());
	descend(level + 1, args);
}

fn body(args: &Args) {
	let _cleanup = Cleanup("main".to_string());
	info!("descending {} frames, then {:?}", args.depth, args.action);
	descend(1, args);
}

fn main() {
	env_logger::init();

	let args = {
		let _exit = exit::Catch::install();
		args::collect()
	};

	if args.run {
		exit::run(|| body(&args));
	} else if args.catch {
		// First in its scope, so it drops after every cleanup in `body`.
		let _exit = exit::Catch::install();
		body(&args);
	} else {
		body(&args);
	}
}
