use anyhow::Result;
use clap::Parser;

use dotsync_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init(args.verbose);

    match args.command {
        cli::Command::Init(opts) => commands::init::run(&args.global, &opts),
        cli::Command::Add(opts) => commands::add::run(&args.global, &opts),
        cli::Command::Remove(opts) => commands::remove::run(&args.global, &opts),
        cli::Command::List(opts) => commands::list::run(&args.global, &opts),
        cli::Command::Status => commands::status::run(&args.global),
        cli::Command::Deploy(opts) => commands::deploy::run(&args.global, &opts),
        cli::Command::Update(opts) => commands::update::run(&args.global, &opts),
        cli::Command::Restore(opts) => commands::restore::run(&args.global, &opts),
        cli::Command::Sync(opts) => commands::sync::run(&args.global, &opts),
        cli::Command::Remote(opts) => commands::remote::run(&args.global, &opts),
        cli::Command::Clone(opts) => commands::clone::run(&args.global, &opts),
        cli::Command::Version => {
            println!("dotsync {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
