//! The install steps, in the order the CLI runs them
//!
//! Every step takes the resolved [`InstallContext`] and owns exactly one
//! on-disk artifact. No step writes a file until its whole in-memory
//! transformation succeeded, and an unchanged file is never rewritten.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::archive::{self, RouteContext, WordSize};
use crate::cmdseq::{self, EncodeError, PatchOutcome};
use crate::cmdseq::codec::CorruptSequence;
use crate::github;
use crate::lineconf::{LineConfigError, LineDocument, LinePatch};
use crate::logging::{log_download, log_info, log_patch, log_warning};

/// Compile arguments given to the postcompiler unless overridden
pub const DEFAULT_COMPILE_ARGS: &str = "--propcombine $path\\$file";

const CMDSEQ_FILE: &str = "CmdSeq.wc";
const CMDSEQ_DEFAULT_FILE: &str = "CmdSeq Default.wc";
const GAMEINFO_FILE: &str = "gameinfo.txt";
const SRCTOOLS_FILE: &str = "srctools.vdf";

const GAMEINFO_SENTINEL: &str = "|gameinfo_path|";
const GAMEINFO_DIRECTIVE: &str = "Game\tHammer";
const GAMEINFO_TOKEN_SET: &[&str] = &["game", "hammer"];
const SRCTOOLS_KEY: &str = "\"gameinfo\"";

// ============================================================================
// Context
// ============================================================================

/// Resolved inputs every step works from. The CLI builds this once; the
/// engine keeps no global state of its own.
#[derive(Debug, Clone)]
pub struct InstallContext {
    /// The game's install directory (steamapps/common/<game>)
    pub game_dir: PathBuf,
    /// Secondary subfolder holding gameinfo.txt ("tf", "portal2", ...)
    pub in_game_folder: String,
    /// FGD file the release ships for this game
    pub fgd_file: String,
    /// Argument string for the postcompiler build step
    pub compile_args: String,
    /// Word size for picking platform binaries out of the archive
    pub word_size: WordSize,
}

impl InstallContext {
    fn bin_dir(&self) -> PathBuf {
        self.game_dir.join("bin")
    }

    /// Where the postcompiler executable lives after install; this exact
    /// path is written into the command sequence.
    fn postcompiler_exe(&self) -> PathBuf {
        self.bin_dir().join("postcompiler").join("postcompiler.exe")
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Anything that aborts an install step
#[derive(Debug)]
pub enum InstallError {
    /// An expected file is missing and has no fallback
    NotFound { path: PathBuf },
    /// The command sequence container is malformed
    Corrupt { path: PathBuf, source: CorruptSequence },
    /// The patched sequence cannot be serialized back
    Encode { path: PathBuf, source: EncodeError },
    /// No configuration in the sequence contains the sentinel step
    NoBuildableConfig { path: PathBuf },
    /// A text config could not be read or written
    LineConfig(LineConfigError),
    /// Network or archive failure, passed through from the transport
    Transport { context: String, reason: String },
    Io { context: String, source: io::Error },
}

impl fmt::Display for InstallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallError::NotFound { path } => {
                write!(f, "couldn't find the file '{}'", path.display())
            }
            InstallError::Corrupt { path, source } => {
                write!(f, "'{}' is corrupt: {}", path.display(), source)
            }
            InstallError::Encode { path, source } => {
                write!(f, "can't rewrite '{}': {}", path.display(), source)
            }
            InstallError::NoBuildableConfig { path } => {
                write!(
                    f,
                    "no buildable configuration in '{}': the {} step was never found",
                    path.display(),
                    cmdseq::BSP_SENTINEL
                )
            }
            InstallError::LineConfig(source) => source.fmt(f),
            InstallError::Transport { context, reason } => {
                write!(f, "{} failed: {}", context, reason)
            }
            InstallError::Io { context, source } => write!(f, "{}: {}", context, source),
        }
    }
}

impl std::error::Error for InstallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InstallError::Corrupt { source, .. } => Some(source),
            InstallError::Encode { source, .. } => Some(source),
            InstallError::LineConfig(source) => Some(source),
            InstallError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<LineConfigError> for InstallError {
    fn from(source: LineConfigError) -> Self {
        InstallError::LineConfig(source)
    }
}

fn io_err(context: &str, source: io::Error) -> InstallError {
    InstallError::Io { context: context.to_string(), source }
}

fn transport_err(context: &str, source: Box<dyn std::error::Error>) -> InstallError {
    InstallError::Transport { context: context.to_string(), reason: source.to_string() }
}

// ============================================================================
// Step 1: CmdSeq.wc
// ============================================================================

/// Add the postcompiler step to every buildable configuration in
/// `bin/CmdSeq.wc`.
///
/// A missing CmdSeq.wc is seeded from the `CmdSeq Default.wc` Hammer ships
/// next to it; if that is missing too the step fails. The file is only
/// rewritten when at least one command was inserted or replaced.
pub fn patch_cmdseq(ctx: &InstallContext) -> Result<PatchOutcome, InstallError> {
    log_patch("Adding postcompiler compile commands");

    let path = ctx.bin_dir().join(CMDSEQ_FILE);
    if !path.is_file() {
        let template = ctx.bin_dir().join(CMDSEQ_DEFAULT_FILE);
        if !template.is_file() {
            return Err(InstallError::NotFound { path });
        }
        fs::copy(&template, &path).map_err(|e| io_err("seeding CmdSeq.wc", e))?;
        log_info("CmdSeq.wc was missing, copied the default template");
    }

    let bytes = fs::read(&path).map_err(|e| io_err("reading CmdSeq.wc", e))?;
    let mut seq = cmdseq::decode(&bytes)
        .map_err(|source| InstallError::Corrupt { path: path.clone(), source })?;

    let exe = ctx.postcompiler_exe();
    let outcome =
        cmdseq::ensure_tool_step(&mut seq, &exe.to_string_lossy(), &ctx.compile_args);

    if outcome.configs_matched == 0 {
        return Err(InstallError::NoBuildableConfig { path });
    }

    if outcome.is_noop() {
        log_warning("Found already existing commands");
    } else {
        let encoded = cmdseq::encode(&seq)
            .map_err(|source| InstallError::Encode { path: path.clone(), source })?;
        fs::write(&path, encoded).map_err(|e| io_err("writing CmdSeq.wc", e))?;
        log_patch(&format!(
            "Added {} command(s) across {} configuration(s)",
            outcome.commands_changed, outcome.configs_matched
        ));
    }

    Ok(outcome)
}

// ============================================================================
// Step 2: gameinfo.txt
// ============================================================================

/// Add the `Game Hammer` entry to the game's gameinfo.txt, keeping every
/// other line untouched.
pub fn patch_gameinfo(ctx: &InstallContext) -> Result<LinePatch, InstallError> {
    log_patch("Checking gameinfo.txt");

    let path = ctx.game_dir.join(&ctx.in_game_folder).join(GAMEINFO_FILE);
    let mut doc = LineDocument::load(&path)?;

    let patch = doc.append_directive(GAMEINFO_SENTINEL, GAMEINFO_TOKEN_SET, GAMEINFO_DIRECTIVE);
    doc.save_if_dirty(&path)?;

    match patch {
        LinePatch::Applied => log_patch("Added a new entry"),
        LinePatch::NoChangeNeeded => log_warning("No need to modify"),
        LinePatch::AnchorMissing => {
            log_warning(&format!(
                "No '{}' line in '{}', nothing changed",
                GAMEINFO_SENTINEL,
                path.display()
            ));
        }
    }
    Ok(patch)
}

// ============================================================================
// Step 3: release download and routing
// ============================================================================

/// Fetch the latest HammerAddons release and route its contents into the
/// game directory.
///
/// The archive is downloaded and extracted inside a temporary directory
/// that is removed on every exit path.
pub fn install_release(ctx: &InstallContext) -> Result<(), InstallError> {
    let releases = github::fetch_releases(github::ADDONS_REPO)
        .map_err(|e| transport_err("listing releases", e))?;

    let Some((tag, release)) = github::pick_latest(releases) else {
        return Err(InstallError::Transport {
            context: "listing releases".to_string(),
            reason: "no release with a usable version tag".to_string(),
        });
    };
    let Some(asset) = release.zip_asset() else {
        return Err(InstallError::Transport {
            context: format!("release {}", release.tag_name),
            reason: "no zip asset attached".to_string(),
        });
    };

    log_download(&format!("Downloading required files of latest version {}", tag));

    // Dropped at the end of the scope, archive and extracted tree included
    let workspace = tempfile::tempdir().map_err(|e| io_err("creating temp dir", e))?;
    let archive_path = workspace.path().join(&asset.name);
    github::download_file(&asset.browser_download_url, &archive_path)
        .map_err(|e| transport_err("downloading release archive", e))?;

    let extracted = workspace.path().join("extracted");
    archive::extract_archive(&archive_path, &extracted)
        .map_err(|e| transport_err("extracting release archive", e))?;

    let route_ctx = RouteContext {
        word_size: ctx.word_size,
        in_game_folder: &ctx.in_game_folder,
        fgd_file: &ctx.fgd_file,
        game_dir: &ctx.game_dir,
    };
    archive::apply_routes(&extracted, &route_ctx)
        .map_err(|e| io_err("installing archive contents", e))?;

    log_download("Downloaded all files!");
    Ok(())
}

// ============================================================================
// Step 4: srctools.vdf
// ============================================================================

/// Point srctools.vdf at the selected game's folder, fetching the default
/// template first if the game has none.
pub fn patch_srctools_config(ctx: &InstallContext) -> Result<LinePatch, InstallError> {
    let path = ctx.game_dir.join(SRCTOOLS_FILE);
    if !path.exists() {
        log_download("Fetching the default srctools.vdf");
        github::download_file(github::SRCTOOLS_TEMPLATE_URL, &path)
            .map_err(|e| transport_err("downloading srctools.vdf template", e))?;
    }

    let desired = format!("\"gameinfo\" \"{}/\"", ctx.in_game_folder);
    let mut doc = LineDocument::load(&path)?;
    let patch = doc.replace_key(SRCTOOLS_KEY, &desired);
    doc.save_if_dirty(&path)?;

    match patch {
        LinePatch::Applied => log_patch("Updated the gameinfo entry in srctools.vdf"),
        LinePatch::NoChangeNeeded => log_warning("srctools.vdf already points at the right game"),
        LinePatch::AnchorMissing => {
            log_warning("srctools.vdf has no gameinfo entry, nothing changed")
        }
    }
    Ok(patch)
}
