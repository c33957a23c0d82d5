use std::sync::Arc;

use anyhow::Context;

use tickscript::{Compiler, Runtime, stdlib};


fn main() -> anyhow::Result<()> {
	let path = std::env::args().nth(1)
		.context("Usage: tickscript <script file>")?;

	let content = std::fs::read_to_string(&path)
		.with_context(|| format!("Failed to read '{path}'"))?;

	let mut compiler = Compiler::new();
	stdlib::install(&mut compiler)?;

	let script = match compiler.compile(content.lines()) {
		Ok(script) => Arc::new(script),
		Err(error) => anyhow::bail!("{path}: {error}"),
	};

	let mut runtime = Runtime::new(script.clone());
	runtime.play(false, false);

	// Drive the runtime with a fixed 60Hz tick until it stops on its own.
	while runtime.is_playing() {
		runtime.update(1.0 / 60.0, 1.0);

		if runtime.is_paused() && runtime.wait_time() <= 0.0 {
			anyhow::bail!("script paused indefinitely with no host to resume it");
		}
	}

	for variable in script.variables() {
		let value = runtime.variable(variable.index).cloned().unwrap_or_default();
		println!("${} = {}", variable.name, value.try_string(&runtime, "<non-scalar>"));
	}

	Ok(())
}
