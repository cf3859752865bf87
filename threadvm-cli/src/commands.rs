//! CLI command implementations.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context};
use threadvm_common::Program;
use threadvm_vm::EngineConfig;
use tracing::{debug, info};

use crate::RunArgs;

/// Read and decode a program image.
pub fn load_program(path: &Path) -> anyhow::Result<Program> {
    let bytes = fs::read(path).with_context(|| format!("cannot read '{}'", path.display()))?;
    let program = Program::from_bytes(&bytes)
        .with_context(|| format!("cannot load '{}'", path.display()))?;
    debug!(path = %path.display(), instructions = program.len(), "program loaded");
    Ok(program)
}

/// Execute a program image.
pub fn run(args: &RunArgs) -> anyhow::Result<()> {
    let path = args
        .file
        .as_deref()
        .ok_or_else(|| anyhow!("no program file given (see --help)"))?;
    let program = load_program(path)?;

    let mut config = EngineConfig::default()
        .with_memory_size(args.memory_size)
        .with_seed(args.seed);
    if let Some(limit) = args.max_steps {
        config = config.with_max_steps(limit);
    }

    if args.benchmark {
        println!("Preprocessing completed, starting benchmark...");
    }

    let started = Instant::now();
    let result = threadvm_vm::run_with(&program, args.dispatch, config).inspect_err(|e| {
        if let Some(word) = program.word_offset(e.at()) {
            eprintln!("fault at image word {word}");
        }
    })?;
    let elapsed = started.elapsed();

    info!(
        exit = ?result.exit,
        debug_register = result.debug_register,
        steps = result.steps,
        "program finished"
    );
    if args.benchmark {
        eprintln!(
            "{} dispatch: {} steps in {:.3?}",
            args.dispatch, result.steps, elapsed
        );
    }
    Ok(())
}

/// Default output path: the input with a `.bin` extension.
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension("bin")
}

/// Assemble a text file to a program image.
pub fn assemble(input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("cannot read '{}'", input.display()))?;
    let program = threadvm_assembler::assemble(&text)
        .with_context(|| format!("cannot assemble '{}'", input.display()))?;

    let output = output.map_or_else(|| default_output(input), Path::to_path_buf);
    let bytes = program.to_bytes();
    fs::write(&output, &bytes).with_context(|| format!("cannot write '{}'", output.display()))?;

    eprintln!(
        "assembled {} instructions ({} bytes) -> {}",
        program.len(),
        bytes.len(),
        output.display()
    );
    Ok(())
}

/// Print a program image as assembly text.
pub fn disassemble(input: &Path) -> anyhow::Result<()> {
    let program = load_program(input)?;
    print!("{}", threadvm_assembler::disassemble(&program));
    Ok(())
}
