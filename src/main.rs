// tern - A small statically typed language on a stack machine
// Copyright (c) 2025 The Tern Authors. MIT licensed.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use tern_embed::{Engine, Value};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() == 2 && (args[1] == "--version" || args[1] == "-v") {
        println!("Tern v0.1.0");
        return;
    }

    let engine = match Engine::new() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to start: {}", e);
            process::exit(1);
        }
    };

    if args.len() > 1 {
        run_files(&args[1..], engine);
    } else {
        run_repl(engine);
    }
}

/// Run a sequence of source files against one engine, so later files see
/// definitions from earlier ones.
fn run_files(files: &[String], mut engine: Engine) {
    for file_path in files {
        if let Err(e) = run_file(file_path, &mut engine) {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

/// Run a single source file.
fn run_file(file_path: &str, engine: &mut Engine) -> Result<(), String> {
    let path = Path::new(file_path);

    match path.extension().and_then(|e| e.to_str()) {
        Some("tern") => {}
        Some(ext) => {
            return Err(format!(
                "Error: unsupported file extension '.{}' for '{}' (expected .tern)",
                ext, file_path
            ));
        }
        None => {
            return Err(format!(
                "Error: file '{}' has no extension (expected .tern)",
                file_path
            ));
        }
    }

    let source =
        fs::read_to_string(path).map_err(|e| format!("Error reading '{}': {}", file_path, e))?;

    engine
        .evaluate_statement(&source)
        .map_err(|e| format!("Error in '{}': {}", file_path, e))?;
    Ok(())
}

/// Run the interactive REPL.
fn run_repl(mut engine: Engine) {
    println!("Tern v0.1.0");
    println!("Type :quit to exit, :dump <source> to disassemble.");

    loop {
        print!("tern> ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }
                if input == ":quit" {
                    break;
                }
                if input == ":dump" {
                    eprintln!("usage: :dump <source>");
                    continue;
                }
                if let Some(rest) = input.strip_prefix(":dump ") {
                    dump(&engine, rest.trim());
                    continue;
                }
                if input.starts_with(':') {
                    eprintln!("Unknown command: {}", input);
                    continue;
                }
                match engine.evaluate_statement(input) {
                    Ok(Some(Value::Unit)) | Ok(None) => {}
                    Ok(Some(value)) => println!("{}", value),
                    Err(e) => eprintln!("{}", e),
                }
            }
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }
    }
}

fn dump(engine: &Engine, source: &str) {
    if source.is_empty() {
        eprintln!("usage: :dump <source>");
        return;
    }
    match engine.dump(source) {
        Ok(listing) => print!("{}", listing),
        Err(e) => eprintln!("{}", e),
    }
}
