use anyhow::{bail, Context, Result};
use colored::Colorize;
use grammar_railroad::diagram::{DiagramCompiler, DiagramOptions};
use grammar_railroad::parser::parse_grammar;
use regex::Regex;
use std::env;
use std::fs;
use std::process;

fn usage(program: &str) -> String {
    format!(
        "Usage: {} <grammar-file> <rule> [--wrap <chars>] [--strip <regex>]",
        program
    )
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("{}", usage(&args[0]));
    }

    let filename = &args[1];
    let rule_name = &args[2];
    let mut options = DiagramOptions::default();

    let mut idx = 3;
    while idx < args.len() {
        match args[idx].as_str() {
            "--wrap" => {
                let value = args.get(idx + 1).with_context(|| usage(&args[0]))?;
                options.wrap_threshold = value
                    .parse()
                    .with_context(|| format!("invalid wrap threshold: {}", value))?;
                idx += 2;
            }
            "--strip" => {
                let value = args.get(idx + 1).with_context(|| usage(&args[0]))?;
                let pattern = Regex::new(value)
                    .with_context(|| format!("invalid strip pattern: {}", value))?;
                options.strip_pattern = Some(pattern);
                idx += 2;
            }
            other => bail!("unknown option {}\n{}", other, usage(&args[0])),
        }
    }

    let source = fs::read_to_string(filename)
        .with_context(|| format!("error reading file {}", filename))?;
    let tree = parse_grammar(&source)
        .with_context(|| format!("error parsing grammar {}", filename))?;

    let compiler = DiagramCompiler::new(options);
    let diagram = compiler.generate(&tree, rule_name);
    if diagram.is_empty() {
        bail!("rule {} not found in {}", rule_name, filename);
    }

    if diagram.wrapped {
        eprintln!("{}", "note: long alternatives were wrapped".yellow());
    }
    println!("{}", diagram.script);
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        process::exit(1);
    }
}
