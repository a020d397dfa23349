use std::io::Write;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use colored::Colorize;
use memcard::{
    load_limits, move_save, transfer, Error, ExportFormat, IconSysTitle, Limits, Memcard, Save,
};

use crate::cli::{Args, Command};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn run(args: Args) -> Result<(), Error> {
    let limits = match &args.config {
        Some(path) => load_limits(path)?,
        None => Limits::default(),
    };
    let open = |path: &Path| Memcard::open_with_limits(path, limits);

    match args.command {
        Command::List(cmd) => list(&open(&cmd.card)?),
        Command::Info(cmd) => info(&open(&cmd.card)?),
        Command::Inspect(cmd) => {
            let card = open(&cmd.card)?;
            let save = find_save(&card, &cmd.save)?;
            inspect(&card, &save);
            Ok(())
        }
        Command::Rename(cmd) => {
            let mut card = open(&cmd.card)?;
            let save = find_save(&card, &cmd.save)?;
            card.rename(&save, &cmd.new_name)?;
            card.persist()?;
            println!(
                "{} {} -> {}",
                "Renamed".green(),
                cmd.save,
                cmd.new_name.green()
            );
            Ok(())
        }
        Command::Delete(cmd) => {
            let mut card = open(&cmd.card)?;
            let save = find_save(&card, &cmd.save)?;
            card.delete(&save)?;
            card.persist()?;
            println!("- {} {}", "Deleted", cmd.save.red());
            Ok(())
        }
        Command::Export(cmd) => {
            let card = open(&cmd.card)?;
            let save = find_save(&card, &cmd.save)?;
            let format = cmd
                .format
                .or_else(|| cmd.output.as_deref().and_then(ExportFormat::from_path))
                .unwrap_or(ExportFormat::Psu);
            let output = match cmd.output {
                Some(path) => path,
                None => default_export_path(&save, format),
            };
            card.export(&save, &output, format)?;
            println!(
                "{} {} to {}",
                "Exported".green(),
                cmd.save,
                output.display()
            );
            Ok(())
        }
        Command::Import(cmd) => {
            let mut card = open(&cmd.card)?;
            let data = std::fs::read(&cmd.file)?;
            let created = cmd.created.unwrap_or_else(now);
            let save = card.import(&cmd.name, &data, created)?;
            card.persist()?;
            println!("+ {} {}", "Imported", save.directory_name.green());
            Ok(())
        }
        Command::Copy(cmd) => {
            ensure_distinct(&cmd.source, &cmd.destination)?;
            let source = open(&cmd.source)?;
            let mut destination = open(&cmd.destination)?;
            let save = find_save(&source, &cmd.save)?;
            let result = transfer(&source, &save, &mut destination, print_progress);
            eprintln!();
            result?;
            destination.persist()?;
            println!("{} {}", "Copied".green(), cmd.save);
            Ok(())
        }
        Command::Move(cmd) => {
            ensure_distinct(&cmd.source, &cmd.destination)?;
            let mut source = open(&cmd.source)?;
            let mut destination = open(&cmd.destination)?;
            let save = find_save(&source, &cmd.save)?;
            let result = move_save(&mut source, &save, &mut destination, print_progress);
            eprintln!();
            result?;
            destination.persist()?;
            source.persist()?;
            println!("{} {}", "Moved".green(), cmd.save);
            Ok(())
        }
        Command::Create(cmd) => {
            Memcard::create(&cmd.path, cmd.size)?;
            println!(
                "{} {} card at {}",
                "Created".green(),
                cmd.size,
                cmd.path.display()
            );
            Ok(())
        }
        Command::Format(cmd) => {
            let mut card = open(&cmd.card)?;
            card.format();
            card.persist()?;
            println!("{} {}", "Formatted".green(), cmd.card.display());
            Ok(())
        }
    }
}

fn find_save(card: &Memcard, name: &str) -> Result<Save, Error> {
    card.list_saves()
        .into_iter()
        .find(|save| save.directory_name == name)
        .ok_or_else(|| Error::NotFound(name.to_owned()))
}

fn default_export_path(save: &Save, format: ExportFormat) -> PathBuf {
    PathBuf::from(format!("{}.{}", save.directory_name, format.extension()))
}

fn ensure_distinct(source: &Path, destination: &Path) -> Result<(), Error> {
    let same = match (source.canonicalize(), destination.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => source == destination,
    };
    if same {
        return Err(Error::ConfigError(
            "source and destination must be different cards".to_string(),
        ));
    }
    Ok(())
}

fn now() -> u32 {
    u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(u32::MAX)
}

fn print_progress(fraction: f32, message: &str) -> bool {
    eprint!(
        "\r{} {:<40}",
        format!("[{:>3.0}%]", fraction * 100.0).dimmed(),
        message
    );
    let _ = std::io::stderr().flush();
    true
}

fn list(card: &Memcard) -> Result<(), Error> {
    let saves = card.list_saves();
    if saves.is_empty() {
        println!("{}", "No saves on this card".dimmed());
        return Ok(());
    }

    for save in saves {
        println!(
            "{:>2}  {:<16}  {:<11}  {:>10}  {}",
            save.slot,
            save.directory_name.green(),
            save.product_code,
            ByteSize::b(u64::from(save.size)).to_string(),
            save.last_modified.format(DATE_FORMAT).to_string().dimmed()
        );
    }
    Ok(())
}

fn info(card: &Memcard) -> Result<(), Error> {
    let stats = card.stats();
    let cluster = memcard::geometry::CLUSTER_SIZE as u64;
    if let Some(path) = card.path() {
        println!("{:<14}{}", "File", path.display());
    }
    println!("{:<14}{}", "Size", stats.tier);
    println!("{:<14}{}", "Saves", stats.saves);
    println!("{:<14}{}", "Clusters", stats.total_clusters);
    println!(
        "{:<14}{} ({})",
        "Free",
        stats.free_clusters,
        ByteSize::b(stats.free_clusters as u64 * cluster)
    );
    Ok(())
}

fn inspect(card: &Memcard, save: &Save) {
    let report = card.inspect(save, &IconSysTitle);
    println!("{:<16}{}", "Directory", report.directory_name.green());
    println!("{:<16}{}", "Product code", report.product_code);
    println!(
        "{:<16}{}",
        "Title",
        report.title.as_deref().unwrap_or("(not detected)")
    );
    println!(
        "{:<16}{}",
        "Modified",
        report.last_modified.format(DATE_FORMAT)
    );
    println!("{:<16}{}", "First cluster", report.cluster);
    println!("{:<16}{}", "Length", ByteSize::b(u64::from(report.size)));
    println!(
        "{:<16}{}",
        "Chain size",
        ByteSize::b(report.raw_size as u64)
    );
    println!("{:<16}{}", "Clusters", report.estimated_clusters);
    if let Some(error) = report.error {
        println!("{:<16}{}", "Error", error.red());
    }
}
