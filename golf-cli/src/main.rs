#[macro_use]
extern crate clap;

use clap::Arg;
use golf_vm::{Memory, Processor, RegisterId};
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
            Arg::with_name("FILE")
                .help("Sets the compiled program file to run")
                .required(true)
                .index(1),
        )
        .get_matches();

    let path = matches.value_of("FILE").unwrap();

    let executable = match golf_file::read_file(path) {
        Ok(executable) => executable,
        Err(err) => {
            eprintln!("error: failed to read {}: {}", path, err);
            process::exit(1);
        }
    };

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
            process::exit((result.exit_code & 0xff) as i32);
        }
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    }
}
