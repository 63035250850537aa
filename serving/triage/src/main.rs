//! 头颅 CT 出血分诊命令行.

mod args;
mod result;
mod runner;

use anyhow::Result;
use args::{Cli, Command};
use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::io;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new().with_level(level).env().init()?;

    match cli.command {
        Command::Classify {
            input,
            config,
            store,
            cmd,
        } => {
            let report = runner::classify(input, config, store, cmd)?;
            println!(
                "status: completed, {} slices, diagnosis {}",
                report.num_slices,
                report.volume_level.final_diagnosis.as_deref().unwrap_or("/")
            );
        }
        Command::ClassifyImage { file, config, cmd } => {
            let verdict = runner::classify_image(&file, config, cmd)?;
            result::describe_verdict_into(&verdict, &mut io::stdout().lock())?;
        }
        Command::Import { file, dir } => {
            let target = runner::import(&file, dir)?;
            println!("imported: {}", target.display());
        }
        Command::Show { store, slices } => runner::show(store, slices, &mut io::stdout().lock())?,
        Command::Status => println!("running"),
    }
    Ok(())
}
