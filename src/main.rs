//! HAInstaller - installs TeamSpen's HammerAddons into a Source game
//!
//! The binary is a thin orchestration layer: it resolves the install
//! context from the command line and runs the patch steps in order.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use hainstaller::archive::WordSize;
use hainstaller::games;
use hainstaller::install::{self, InstallContext, DEFAULT_COMPILE_ARGS};
use hainstaller::logging::{init_logger, log_error, log_info};

#[derive(Parser)]
#[command(
    name = "hainstaller",
    version,
    about = "Installs TeamSpen's HammerAddons into a Source game's SDK toolchain"
)]
struct Cli {
    /// The game's install directory (steamapps/common/<game>)
    #[arg(long)]
    game_dir: PathBuf,

    /// Name of a supported game, e.g. "Team Fortress 2"
    #[arg(short, long)]
    game: Option<String>,

    /// In-game folder override (defaults to the selected game's)
    #[arg(long)]
    folder: Option<String>,

    /// FGD file override (defaults to the selected game's)
    #[arg(long)]
    fgd: Option<String>,

    /// Arguments for the postcompiler compile step
    #[arg(short, long, default_value = DEFAULT_COMPILE_ARGS)]
    args: String,

    /// Do not modify the CmdSeq.wc file
    #[arg(long)]
    skip_cmdseq: bool,

    /// Do not modify the gameinfo.txt file
    #[arg(long)]
    skip_gameinfo: bool,

    /// Do not download any files
    #[arg(long)]
    skip_download: bool,
}

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();

    // User interrupts are handled here and nowhere deeper; the patch steps
    // never leave a partially written file behind.
    let handler = ctrlc::set_handler(|| {
        log_error("Installation interrupted");
        std::process::exit(130);
    });
    if let Err(e) = handler {
        log_error(&format!("Couldn't register the interrupt handler: {}", e));
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = resolve_context(&cli)?;
    log_info(&format!(
        "Installing HammerAddons into '{}' (game folder '{}')",
        ctx.game_dir.display(),
        ctx.in_game_folder
    ));

    if !cli.skip_cmdseq {
        install::patch_cmdseq(&ctx)?;
    }
    if !cli.skip_gameinfo {
        install::patch_gameinfo(&ctx)?;
    }
    if !cli.skip_download {
        install::install_release(&ctx)?;
        install::patch_srctools_config(&ctx)?;
    }

    log_info("Finished installing HammerAddons!");
    Ok(())
}

/// Build the context the engine steps run against. Game selection only
/// resolves identifiers; nothing is discovered from the system.
fn resolve_context(cli: &Cli) -> Result<InstallContext, Box<dyn std::error::Error>> {
    if !cli.game_dir.is_dir() {
        return Err(format!("'{}' is not a directory", cli.game_dir.display()).into());
    }

    let game = match &cli.game {
        Some(name) => Some(
            games::lookup(name)
                .ok_or_else(|| format!("the game '{}' is not supported", name))?,
        ),
        None => None,
    };

    let in_game_folder = cli
        .folder
        .clone()
        .or_else(|| game.map(|g| g.folder.to_string()))
        .ok_or("either --game or --folder is required")?;
    let fgd_file = cli
        .fgd
        .clone()
        .or_else(|| game.map(|g| g.fgd_file.to_string()))
        .ok_or("either --game or --fgd is required")?;

    Ok(InstallContext {
        game_dir: cli.game_dir.clone(),
        in_game_folder,
        fgd_file,
        compile_args: cli.args.clone(),
        word_size: WordSize::host(),
    })
}
