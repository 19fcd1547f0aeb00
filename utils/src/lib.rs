pub mod errors;
pub mod label;

pub use errors::*;
pub use label::*;

use std::fmt::Display;

pub fn fatal_error(str: &str) -> ! {
	eprintln!("{}: {}", console::style("fatal error").bold().red(), str);
	std::process::exit(1);
}

pub fn warning(str: impl Display) {
	eprintln!("{}: {}", console::style("warning").bold().yellow(), str);
}

// Read/write sets of an instruction, keyed by the temp type of the IR.
pub trait UseTemp<T> {
	fn get_read(&self) -> Vec<T> {
		Vec::new()
	}
	fn get_write(&self) -> Option<T> {
		None
	}
}
