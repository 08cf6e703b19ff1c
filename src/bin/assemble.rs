//! Assembler CLI.
//!
//! Translates an assembly source file into an executable object file.
//!
//! # Usage
//! ```text
//! assemble <input> [<output>]
//! ```
//!
//! Diagnostics are written to stderr in compiler style
//! (`path:line:col: error: message`); the exit code is 0 on success and 1 on
//! any error.

use bytevm::assembler::{self, DEFAULT_OUTPUT};
use std::env;
use std::path::PathBuf;
use std::process;

const USAGE: &str = "\
Bytecode assembler

USAGE:
    {program} <input> [<output>]

ARGS:
    <input>     Assembly source file
    <output>    Object file path (defaults to out.pob)

OPTIONS:
    -h, --help  Print this help message

EXAMPLES:
    # Assemble to the default output name
    {program} program.asm

    # Assemble with an explicit output
    {program} program.asm program.pob
";

fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }
    if args.len() > 3 {
        eprintln!("unexpected argument: {}", args[3]);
        print_usage(&args[0]);
        process::exit(1);
    }

    let input = PathBuf::from(&args[1]);
    let output = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    if assembler::assemble_file(&input, &output).is_err() {
        process::exit(1);
    }
}
