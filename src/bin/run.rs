//! Object runner CLI.
//!
//! Loads an object file and executes it.
//!
//! # Usage
//! ```text
//! run <object> [<limit>]
//! ```
//!
//! A negative limit (the default) runs unbounded. The exit code is the
//! error-kind enumerator: 0 ok, 1 unrecognized opcode, 2 illegal memory
//! access, 3 stack overflow, 4 stack underflow; load and I/O failures exit 1.

use bytevm::assembler::diagnostics::Diagnostics;
use bytevm::vm::Vm;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

const USAGE: &str = "\
Bytecode runner

USAGE:
    {program} <object> [<limit>]

ARGS:
    <object>    Object file produced by the assembler
    <limit>     Instruction budget; negative runs unbounded (default -1)

OPTIONS:
    -h, --help  Print this help message
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

    let path = PathBuf::from(&args[1]);
    let origin = path.display().to_string();

    let mut limit: i64 = -1;
    if let Some(arg) = args.get(2) {
        if arg.starts_with("--") {
            eprintln!("unknown option: {arg}");
            process::exit(1);
        }
        match arg.parse::<i64>() {
            Ok(value) => limit = value,
            Err(_) => {
                eprintln!("invalid limit: {arg}");
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let mut vm = match Vm::load_file(&path) {
        Ok(vm) => vm,
        Err(err) => {
            eprint!("{}", Diagnostics::render_plain(&origin, &err));
            process::exit(err.exit_code());
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = vm.execute(limit, &mut out) {
        let _ = out.flush();
        let message = format!("{err} (pc: 0x{:X})", vm.pc());
        eprint!("{}", Diagnostics::render_plain(&origin, &message));
        process::exit(err.exit_code());
    }
    let _ = out.flush();
}
