use std::env;

use assembler::assembler;
use assembler::error::AssemblerError;
use assembler::logging;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        logging::report(&[AssemblerError::NoSourceFile]);
        std::process::exit(1);
    }

    let mut had_failure = false;

    for stem in &args[1..] {
        match assembler::assemble_file(stem) {
            Ok(()) => {}
            Err(errors) => {
                had_failure = true;
                logging::report(&errors);
            }
        }
    }

    if had_failure {
        std::process::exit(2);
    }
}
