//! Progs VM CLI
//!
//! Entry point for the `progs` binary. Parses CLI arguments and delegates
//! to the Runtime.

use std::process::ExitCode;

use bytecode_system::LoadOptions;
use clap::Parser as ClapParser;
use progs_cli::runtime::{apply_overrides, load_config};
use progs_cli::{logging, repl, Cli, CliError, CliResult, Command, Runtime};

fn run(cli: Cli) -> CliResult<()> {
    let options = LoadOptions {
        expected_crc: cli.crc,
    };
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Info { file, json } => {
            let runtime = Runtime::load_file(&file, &options, config)?;
            let info = runtime.info();
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print!("{}", info);
            }
        }
        Command::Disasm { file, function } => {
            let runtime = Runtime::load_file(&file, &options, config)?;
            print!("{}", runtime.disassemble(function.as_deref())?);
        }
        Command::Run(args) => {
            let config = apply_overrides(config, &args);
            let mut runtime = Runtime::load_file(&args.file, &options, config)?;
            let result = runtime.run(&args);
            if let Some(limit) = args.profile {
                eprint!("{}", runtime.profile_table(limit));
            }
            if let Some(text) = result? {
                println!("{}", text);
            }
        }
        Command::Repl { file } => {
            let mut runtime = Runtime::load_file(&file, &options, config)?;
            repl::run_repl(&mut runtime)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Runtime(e)) => {
            eprintln!("Progs Error: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
