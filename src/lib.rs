//! Exit the process from any call depth without skipping destructors. Needs
//! `panic = "unwind"`.

pub mod code;
pub mod report;
pub mod signal;

pub use code::{Code, FAILURE, SUCCESS};
pub use report::{on_err, on_errf, with_err, with_errf};
pub use signal::{intercept, run, with, Catch};
