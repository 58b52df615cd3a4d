#[macro_use]
extern crate clap;

use clap::Arg;
use golf_asm::{assemble, AssembleError, DebugInfo};
use golf_file::Executable;
use golf_vm::{Memory, Processor, RegisterId};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn main() {
    init_logging();

    let matches = app_from_crate!()
        .arg(
            Arg::with_name("SOURCE")
                .help("Sets the assembly source file to assemble")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("run")
                .short("r")
                .long("run")
                .help("Executes the assembled program directly instead of writing a binary"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUT")
                .help("Sets the output binary path (default: SOURCE with extension replaced by .bin)"),
        )
        .arg(
            Arg::with_name("debug")
                .short("d")
                .long("debug")
                .takes_value(true)
                .value_name("DBG")
                .help("Sets the debug sidecar path (default: SOURCE with extension replaced by .dbg)"),
        )
        .get_matches();

    let source_path = Path::new(matches.value_of("SOURCE").unwrap());
    let run = matches.is_present("run");
    let output_path: PathBuf = matches
        .value_of("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| source_path.with_extension("bin"));
    let debug_path: PathBuf = matches
        .value_of("debug")
        .map(PathBuf::from)
        .unwrap_or_else(|| source_path.with_extension("dbg"));

    let exit_code = match run_assemble(source_path, run, &output_path, &debug_path) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err);
            1
        }
    };
    process::exit(exit_code);
}

fn run_assemble(
    source_path: &Path,
    run: bool,
    output_path: &Path,
    debug_path: &Path,
) -> Result<i32, AssembleError> {
    let source = fs::read_to_string(source_path)?;
    let (executable, debug_info) = assemble(&source)?;

    if run {
        return Ok(execute(&executable));
    }

    golf_file::write_file(output_path, &executable)?;
    write_debug_info(debug_path, &debug_info)?;
    Ok(0)
}

fn write_debug_info(path: &Path, debug_info: &DebugInfo) -> Result<(), AssembleError> {
    let json = serde_json::to_string_pretty(debug_info).expect("DebugInfo is always representable as JSON");
    fs::write(path, json)?;
    Ok(())
}

fn execute(executable: &Executable) -> i32 {
    let memory = Memory::new(executable.data().to_vec());
    let processor = Processor::new(executable.instructions().to_vec(), memory);

    match processor.run() {
        Ok(result) => {
            println!(
                "Execution terminated after {} cycles with exit code {}. Register file at exit:",
                result.cycle_count, result.exit_code
            );
            for letter in b'a'..=b'z' {
                let id = RegisterId::from_letter(letter as char).unwrap();
                let value = result.registers.get(id);
                println!("  {} = {} ({:#018x})", id, value, value);
            }
            (result.exit_code & 0xff) as i32
        }
        Err(err) => {
            eprintln!("error: {}", err);
            1
        }
    }
}
