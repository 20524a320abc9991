use crate::code::Code;
use log::{debug, warn};
use std::cell::Cell;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::thread;

thread_local! {
	static ARMED: Cell<usize> = Cell::new(0);
	static PENDING: Cell<Option<Code>> = Cell::new(None);
}

static FORGET_ON_PANIC: Once = Once::new();

fn armed() -> bool {
	ARMED.with(|a| a.get() > 0)
}

/// Chain a panic hook that drops any recorded exit code. Exit signals unwind
/// with `resume_unwind` and never reach a hook, so anything that does is an
/// unrelated panic and must not inherit an earlier, swallowed signal.
fn forget_stale_signals() {
	FORGET_ON_PANIC.call_once(|| {
		let previous = panic::take_hook();
		panic::set_hook(Box::new(move |info| {
			let _ = PENDING.try_with(|p| p.set(None));
			previous(info);
		}));
	});
}

/// Marks the current thread as having a catcher for as long as it lives.
struct Armed(PhantomData<*const ()>);

impl Armed {
	fn new() -> Armed {
		ARMED.with(|a| a.set(a.get() + 1));
		Armed(PhantomData)
	}
}

impl Drop for Armed {
	fn drop(&mut self) {
		ARMED.with(|a| a.set(a.get() - 1));
	}
}

/// Unwind the current thread and exit the process with `code` once the
/// catcher is reached.
///
/// With no catcher on this thread it is an ordinary panic: the default hook
/// reports it and the process ends with the runtime's abnormal status. Catchers
/// are per thread, so a signal from a spawned thread only reaches that thread's
/// `JoinHandle`.
#[track_caller]
pub fn with(code: i32) -> ! {
	let code = Code::from(code);
	if armed() {
		debug!("exit requested with code {}", code.get());
		PENDING.with(|p| p.set(Some(code)));
		// No panic hook: the intentional path prints nothing.
		panic::resume_unwind(Box::new(code))
	}
	warn!(
		"exit requested with code {} on thread '{}' which has no catcher",
		code.get(),
		thread::current().name().unwrap_or("<unnamed>")
	);
	panic::panic_any(code)
}

/// Scope guard that exits the process when an exit signal unwinds past it.
///
/// Bind it as the first local of `main`. Unrelated panics pass through
/// untouched, and a normal return does nothing.
///
/// Leaking the guard (`mem::forget`, an `Rc` cycle) leaves the thread marked
/// as caught for good, so a later [`with`] escapes with status 101 and no
/// panic report.
#[must_use = "the catcher acts when dropped; bind it to a named local such as `_exit`"]
pub struct Catch {
	_armed: Armed,
}

impl Catch {
	pub fn install() -> Catch {
		forget_stale_signals();
		debug!("exit catcher installed");
		Catch {
			_armed: Armed::new(),
		}
	}
}

impl Drop for Catch {
	fn drop(&mut self) {
		let pending = PENDING.with(Cell::take);
		if !thread::panicking() {
			return;
		}
		if let Some(code) = pending {
			debug!("caught exit signal, terminating with code {}", code.get());
			code.exit();
		}
	}
}

/// Run `f` with a catcher armed and hand back the exit code it signalled, if
/// any, instead of exiting. Other panics are resumed unchanged.
pub fn intercept<F, R>(f: F) -> Result<R, Code>
where
	F: FnOnce() -> R,
{
	let outer = PENDING.with(Cell::take);
	let outcome = {
		let _armed = Armed::new();
		panic::catch_unwind(AssertUnwindSafe(f))
	};
	PENDING.with(|p| p.set(outer));

	match outcome {
		Ok(value) => Ok(value),
		Err(payload) => match payload.downcast::<Code>() {
			Ok(code) => Err(*code),
			Err(payload) => panic::resume_unwind(payload),
		},
	}
}

/// `fn main() { exit::run(|| ..) }`
pub fn run<F: FnOnce()>(f: F) {
	if let Err(code) = intercept(f) {
		debug!("caught exit signal, terminating with code {}", code.get());
		code.exit();
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use std::cell::RefCell;
	use std::mem;
	use std::rc::Rc;

	struct Cleanup {
		name: &'static str,
		log: Rc<RefCell<Vec<&'static str>>>,
	}

	impl Drop for Cleanup {
		fn drop(&mut self) {
			self.log.borrow_mut().push(self.name);
		}
	}

	fn cleanup(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Cleanup {
		Cleanup {
			name,
			log: Rc::clone(log),
		}
	}

	fn pending() -> Option<Code> {
		PENDING.with(|p| p.get())
	}

	#[test]
	fn intercept_passes_values_through() {
		assert_eq!(intercept(|| 40 + 2), Ok(42));
	}

	#[test]
	fn intercept_yields_the_signalled_code() {
		for &c in &[0, 1, 42, 255, -1] {
			assert_eq!(intercept(|| -> () { with(c) }), Err(Code::new(c)));
		}
	}

	#[test]
	fn cleanups_run_in_reverse_order_before_exit() {
		let log = Rc::new(RefCell::new(Vec::new()));

		fn inner(log: &Rc<RefCell<Vec<&'static str>>>) {
			let _c = cleanup("inner", log);
			with(9);
		}

		let result = intercept(|| {
			let _a = cleanup("outer", &log);
			let _b = cleanup("middle", &log);
			inner(&log);
		});

		assert_eq!(result, Err(Code::new(9)));
		assert_eq!(*log.borrow(), vec!["inner", "middle", "outer"]);
	}

	#[test]
	fn unrelated_panics_are_resumed() {
		let result = panic::catch_unwind(|| intercept(|| panic!("unrelated")));
		let payload = result.unwrap_err();
		assert_eq!(payload.downcast_ref::<&str>(), Some(&"unrelated"));
	}

	#[test]
	fn nested_intercept_leaves_outer_signal_alone() {
		let result = intercept(|| -> () {
			let inner = intercept(|| -> () { with(2) });
			assert_eq!(inner, Err(Code::new(2)));
			with(5)
		});
		assert_eq!(result, Err(Code::new(5)));
	}

	#[test]
	fn catcher_is_armed_only_inside_intercept() {
		assert!(!armed());
		assert_eq!(intercept(armed), Ok(true));
		assert!(!armed());
	}

	#[test]
	fn signal_on_another_thread_misses_the_catcher() {
		let joined = intercept(|| thread::spawn(|| -> i32 { with(3) }).join());
		let payload = joined.unwrap().unwrap_err();
		assert_eq!(payload.downcast_ref::<Code>(), Some(&Code::new(3)));
	}

	#[test]
	fn normal_return_through_catch_clears_stale_signal() {
		PENDING.with(|p| p.set(Some(Code::new(8))));
		{
			let _exit = Catch::install();
		}
		assert_eq!(pending(), None);
	}

	#[test]
	fn unrelated_panic_forgets_a_swallowed_signal() {
		let _exit = Catch::install();

		let _ = panic::catch_unwind(|| -> () { with(7) });
		assert_eq!(pending(), Some(Code::new(7)));

		let _ = panic::catch_unwind(|| panic!("unrelated"));
		assert_eq!(pending(), None);
	}

	#[test]
	fn forgotten_catch_keeps_the_thread_armed() {
		let still_armed = thread::spawn(|| {
			mem::forget(Catch::install());
			armed()
		})
		.join()
		.unwrap();
		assert!(still_armed);
	}
}
