use std::process;

/// Process exit status. Only the low 8 bits reach the parent on Unix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("exit with status {0}")]
pub struct Code(i32);

pub const SUCCESS: Code = Code(0);

/// Used by all of the reporting helpers.
pub const FAILURE: Code = Code(1);

impl Code {
	pub const fn new(code: i32) -> Code {
		Code(code)
	}

	pub const fn get(self) -> i32 {
		self.0
	}

	/// Terminate the process right now with this code. No destructors run.
	pub fn exit(self) -> ! {
		process::exit(self.0)
	}
}

impl From<i32> for Code {
	fn from(code: i32) -> Code {
		Code(code)
	}
}

impl From<Code> for i32 {
	fn from(code: Code) -> i32 {
		code.0
	}
}
