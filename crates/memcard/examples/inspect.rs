use std::env;
use std::process;

use memcard::{IconSysTitle, Memcard};

fn main() -> Result<(), memcard::Error> {
    let path = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example inspect -- <path-to-memcard>");
        process::exit(1);
    });

    let card = Memcard::open(&path)?;
    let geometry = card.geometry();
    eprintln!(
        "{} card: FAT at {:#x}, directory at {:#x}, {} clusters",
        card.tier(),
        geometry.fat_offset(),
        geometry.directory_offset(),
        geometry.cluster_count()
    );

    let saves = card.list_saves();
    if saves.is_empty() {
        eprintln!("No saves found.");
    }

    for save in &saves {
        let chain: Vec<u16> = card.walk_chain(save.cluster).collect();
        eprintln!("{:#?}", card.inspect(save, &IconSysTitle));
        eprintln!("chain: {chain:?}");
    }

    Ok(())
}
