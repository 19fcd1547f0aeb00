mod cli;
mod demo;
mod logging;

use std::{
	fs::File,
	io::{self, Write},
};

use anyhow::Result;
use clap::Parser;
use cli::Args;
use log::trace;
use optimizer::run_pipeline;
use simulator::MiddleSimulator;
use utils::{fatal_error, map_sys_err, warning};

fn main() -> Result<()> {
	logging::init();
	trace!("start");
	let args = Args::parse();

	let mut writer: Box<dyn Write> = if let Some(o) = args.output {
		Box::new(File::create(o).map_err(map_sys_err)?)
	} else {
		Box::new(io::stdout())
	};

	let mut program = demo::build_demo();
	let passes = args
		.passes
		.unwrap_or_else(|| "derived-iv-elim,simple-licm".to_string());
	if passes.trim().is_empty() {
		fatal_error("empty pass pipeline");
	}
	let changed = run_pipeline(&mut program, &passes)?;
	trace!("pipeline changed: {}", changed);

	if args.llvm {
		write!(writer, "{}", program)?;
		return Ok(());
	}

	if args.run {
		let mut simu = MiddleSimulator::new(String::new());
		simu.run_program(&program);
		for line in &simu.output {
			writeln!(writer, "{}", line)?;
		}
		if let Some(value) = simu.return_value() {
			writeln!(writer, "exit: {}", value)?;
		}
	} else {
		warning("nothing to do; pass --llvm or --run");
	}

	Ok(())
}
