// Copyright ⓒ 2019-2020 Lewis Belcher
// Licensed under the MIT license (see LICENSE or <http://opensource.org/licenses/MIT>).
// All files in the project carrying such notice may not be copied, modified, or
// distributed except according to those terms.

use crate::code::FAILURE;
use crate::signal;
use std::fmt::{self, Display};
use std::io::{self, Write};

fn emit(line: fmt::Arguments<'_>) {
	// A closed stdout must not turn an exit into a panic.
	let _ = writeln!(io::stdout().lock(), "{}", line);
}

#[track_caller]
fn fail(line: fmt::Arguments<'_>) -> ! {
	emit(line);
	signal::with(FAILURE.get())
}

/// On `Err`, print `"<message>: <error>"` and exit with status 1. On `Ok`,
/// return the value without printing anything.
///
/// See [`on_errf!`](crate::on_errf) for the formatting shorthand.
#[track_caller]
pub fn on_errf<T, E: Display>(result: Result<T, E>, message: fmt::Arguments<'_>) -> T {
	match result {
		Ok(value) => value,
		Err(err) => fail(format_args!("{}: {}", message, err)),
	}
}

/// On `Err`, print the error and exit with status 1. On `Ok`, return the value.
#[track_caller]
pub fn on_err<T, E: Display>(result: Result<T, E>) -> T {
	match result {
		Ok(value) => value,
		Err(err) => fail(format_args!("{}", err)),
	}
}

/// Print `err` and exit with status 1.
#[track_caller]
pub fn with_err<E: Display>(err: E) -> ! {
	fail(format_args!("{}", err))
}

/// Print `message` and exit with status 1.
#[track_caller]
pub fn with_errf(message: fmt::Arguments<'_>) -> ! {
	fail(message)
}

/// `on_errf!(result, "reading {}", path)`
#[macro_export]
macro_rules! on_errf {
	($result:expr, $($arg:tt)+) => {
		$crate::report::on_errf($result, format_args!($($arg)+))
	};
}

/// `with_errf!("no such recipe {}", name)`
#[macro_export]
macro_rules! with_errf {
	($($arg:tt)+) => {
		$crate::report::with_errf(format_args!($($arg)+))
	};
}
