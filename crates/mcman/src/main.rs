use colored::Colorize;

mod cli;
mod commands;
mod logger;

fn main() {
    let args: cli::Args = argh::from_env();
    logger::init(args.verbose);

    if let Err(err) = commands::run(args) {
        eprintln!("{} {}", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}
