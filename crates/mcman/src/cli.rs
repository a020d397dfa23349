use std::path::PathBuf;

use argh::FromArgs;
use memcard::{ExportFormat, SizeTier};

#[derive(FromArgs, Debug)]
/// Manage saves on PS2 memory card images.
pub struct Args {
    /// also log skipped entries and chain anomalies
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// TOML file with traversal limits
    #[argh(option)]
    pub config: Option<PathBuf>,

    #[argh(subcommand)]
    pub command: Command,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
pub enum Command {
    List(ListArgs),
    Info(InfoArgs),
    Inspect(InspectArgs),
    Rename(RenameArgs),
    Delete(DeleteArgs),
    Export(ExportArgs),
    Import(ImportArgs),
    Copy(CopyArgs),
    Move(MoveArgs),
    Create(CreateArgs),
    Format(FormatArgs),
}

#[derive(FromArgs, Debug)]
/// List the saves on a card.
#[argh(subcommand, name = "list")]
pub struct ListArgs {
    /// path to the card image
    #[argh(positional)]
    pub card: PathBuf,
}

#[derive(FromArgs, Debug)]
/// Show card size and free space.
#[argh(subcommand, name = "info")]
pub struct InfoArgs {
    /// path to the card image
    #[argh(positional)]
    pub card: PathBuf,
}

#[derive(FromArgs, Debug)]
/// Show diagnostics for one save.
#[argh(subcommand, name = "inspect")]
pub struct InspectArgs {
    /// path to the card image
    #[argh(positional)]
    pub card: PathBuf,
    /// directory name of the save
    #[argh(positional)]
    pub save: String,
}

#[derive(FromArgs, Debug)]
/// Rename a save directory.
#[argh(subcommand, name = "rename")]
pub struct RenameArgs {
    /// path to the card image
    #[argh(positional)]
    pub card: PathBuf,
    /// directory name of the save
    #[argh(positional)]
    pub save: String,
    /// new directory name (at most 16 characters)
    #[argh(positional)]
    pub new_name: String,
}

#[derive(FromArgs, Debug)]
/// Delete a save.
#[argh(subcommand, name = "delete")]
pub struct DeleteArgs {
    /// path to the card image
    #[argh(positional)]
    pub card: PathBuf,
    /// directory name of the save
    #[argh(positional)]
    pub save: String,
}

#[derive(FromArgs, Debug)]
/// Write a save's raw data to a file.
#[argh(subcommand, name = "export")]
pub struct ExportArgs {
    /// path to the card image
    #[argh(positional)]
    pub card: PathBuf,
    /// directory name of the save
    #[argh(positional)]
    pub save: String,
    /// file to write; defaults to the save name plus the format's extension
    #[argh(positional)]
    pub output: Option<PathBuf>,
    /// psu or max; guessed from the output extension when omitted
    #[argh(option)]
    pub format: Option<ExportFormat>,
}

#[derive(FromArgs, Debug)]
/// Install raw save data from a file as a new save.
#[argh(subcommand, name = "import")]
pub struct ImportArgs {
    /// path to the card image
    #[argh(positional)]
    pub card: PathBuf,
    /// file holding the raw save data
    #[argh(positional)]
    pub file: PathBuf,
    /// directory name for the new save
    #[argh(positional)]
    pub name: String,
    /// creation time in POSIX seconds (defaults to now)
    #[argh(option)]
    pub created: Option<u32>,
}

#[derive(FromArgs, Debug)]
/// Copy a save to another card.
#[argh(subcommand, name = "copy")]
pub struct CopyArgs {
    /// card to copy from
    #[argh(positional)]
    pub source: PathBuf,
    /// directory name of the save
    #[argh(positional)]
    pub save: String,
    /// card to copy to
    #[argh(positional)]
    pub destination: PathBuf,
}

#[derive(FromArgs, Debug)]
/// Move a save to another card.
#[argh(subcommand, name = "move")]
pub struct MoveArgs {
    /// card to copy from
    #[argh(positional)]
    pub source: PathBuf,
    /// directory name of the save
    #[argh(positional)]
    pub save: String,
    /// card to copy to
    #[argh(positional)]
    pub destination: PathBuf,
}

#[derive(FromArgs, Debug)]
/// Create a new, formatted card image.
#[argh(subcommand, name = "create")]
pub struct CreateArgs {
    /// where to write the new card
    #[argh(positional)]
    pub path: PathBuf,
    /// card size in MiB: 8, 16 or 32
    #[argh(option, default = "SizeTier::Mb8")]
    pub size: SizeTier,
}

#[derive(FromArgs, Debug)]
/// Erase every save on a card.
#[argh(subcommand, name = "format")]
pub struct FormatArgs {
    /// path to the card image
    #[argh(positional)]
    pub card: PathBuf,
}
