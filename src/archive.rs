//! Routes the contents of a HammerAddons release archive
//!
//! A release zip carries a handful of well-known top-level entries; each one
//! either maps to a destination under the game's install directory or is
//! ignored. The mapping is a table of rules so a new game or platform
//! variant is one more entry, not another branch.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::logging::{log_info, log_warning};

// ============================================================================
// Routing context
// ============================================================================

/// Word size of the platform the tools will run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSize {
    Bits32,
    Bits64,
}

impl WordSize {
    /// Word size of the host this installer runs on
    pub fn host() -> Self {
        if cfg!(target_pointer_width = "64") {
            WordSize::Bits64
        } else {
            WordSize::Bits32
        }
    }

    /// The archive folder holding binaries for this word size
    pub fn binaries_folder(self) -> &'static str {
        match self {
            WordSize::Bits32 => "win32",
            WordSize::Bits64 => "win64",
        }
    }
}

/// Everything a routing decision may depend on
#[derive(Debug, Clone)]
pub struct RouteContext<'a> {
    pub word_size: WordSize,
    /// In-game folder id of the selected game ("tf", "portal2", ...)
    pub in_game_folder: &'a str,
    /// Declared FGD file name of the selected game
    pub fgd_file: &'a str,
    /// Root of the game's install directory
    pub game_dir: &'a Path,
}

/// A top-level entry of the extracted archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub is_dir: bool,
    /// Immediate child names, for rules that look one level deeper
    pub children: Vec<String>,
}

impl ArchiveEntry {
    fn has_child(&self, name: &str) -> bool {
        self.children.iter().any(|c| c == name)
    }
}

/// A decided copy: `source` is relative to the extracted root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    pub rule: &'static str,
    pub source: PathBuf,
    pub dest: PathBuf,
    pub is_dir: bool,
}

// ============================================================================
// Route table
// ============================================================================

struct RouteRule {
    name: &'static str,
    applies: fn(&ArchiveEntry, &RouteContext<'_>) -> bool,
    /// Subfolder of the entry to copy instead of the entry itself
    source_sub: Option<&'static str>,
    dest: fn(&RouteContext<'_>) -> PathBuf,
}

const ROUTES: &[RouteRule] = &[
    // Compiler binaries for the host word size; only the postcompiler
    // subfolder is ours to install.
    RouteRule {
        name: "postcompiler binaries",
        applies: |entry, ctx| {
            entry.is_dir
                && entry.name == ctx.word_size.binaries_folder()
                && entry.has_child("postcompiler")
        },
        source_sub: Some("postcompiler"),
        dest: |ctx| ctx.game_dir.join("bin").join("postcompiler"),
    },
    // Hammer editor integration files
    RouteRule {
        name: "hammer files",
        applies: |entry, _| entry.is_dir && entry.name == "hammer",
        source_sub: None,
        dest: |ctx| ctx.game_dir.join("hammer"),
    },
    // Shared map instances, only shipped for some games
    RouteRule {
        name: "instances",
        applies: |entry, ctx| {
            entry.is_dir && entry.name == "instances" && entry.has_child(ctx.in_game_folder)
        },
        source_sub: None,
        dest: |ctx| ctx.game_dir.join("sdk_content").join("maps").join("instances"),
    },
    // The game's entity definitions, next to the compiler binaries
    RouteRule {
        name: "entity definitions",
        applies: |entry, ctx| !entry.is_dir && entry.name == ctx.fgd_file,
        source_sub: None,
        dest: |ctx| ctx.game_dir.join("bin"),
    },
];

/// Decide a destination for every entry; unmatched entries are dropped.
pub fn plan_routes(entries: &[ArchiveEntry], ctx: &RouteContext<'_>) -> Vec<RoutePlan> {
    let mut plans = Vec::new();
    for entry in entries {
        let Some(rule) = ROUTES.iter().find(|rule| (rule.applies)(entry, ctx)) else {
            continue;
        };
        let source = match rule.source_sub {
            Some(sub) => Path::new(&entry.name).join(sub),
            None => PathBuf::from(&entry.name),
        };
        plans.push(RoutePlan {
            rule: rule.name,
            source,
            dest: (rule.dest)(ctx),
            is_dir: entry.is_dir,
        });
    }
    plans
}

// ============================================================================
// Filesystem side
// ============================================================================

/// Extract a release zip into `dest` (usually a temp dir).
pub fn extract_archive(zip_path: &Path, dest: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    archive.extract(dest)?;
    Ok(())
}

/// List the top-level entries of an extracted archive.
pub fn scan_entries(root: &Path) -> io::Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        let is_dir = path.is_dir();
        let mut children = Vec::new();
        if is_dir {
            for child in fs::read_dir(&path)? {
                children.push(child?.file_name().to_string_lossy().to_string());
            }
        }
        entries.push(ArchiveEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            is_dir,
            children,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Route everything under `root` into the game directory.
///
/// Returns the plans that were applied. Entries without a rule are logged
/// and skipped.
pub fn apply_routes(root: &Path, ctx: &RouteContext<'_>) -> io::Result<Vec<RoutePlan>> {
    let entries = scan_entries(root)?;
    let plans = plan_routes(&entries, ctx);

    for entry in &entries {
        if !plans.iter().any(|p| p.source.starts_with(&entry.name)) {
            log_warning(&format!("Ignoring archive entry '{}'", entry.name));
        }
    }

    for plan in &plans {
        let source = root.join(&plan.source);
        if plan.is_dir {
            copy_dir_contents(&source, &plan.dest)?;
        } else {
            fs::create_dir_all(&plan.dest)?;
            let file_name = source.file_name().unwrap_or_default();
            fs::copy(&source, plan.dest.join(file_name))?;
        }
        log_info(&format!(
            "Installed {} -> {}",
            plan.rule,
            plan.dest.display()
        ));
    }

    Ok(plans)
}

/// Copy everything inside `src` into `dst`, creating directories as needed.
fn copy_dir_contents(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(name: &str, children: &[&str]) -> ArchiveEntry {
        ArchiveEntry {
            name: name.to_string(),
            is_dir: true,
            children: children.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn file(name: &str) -> ArchiveEntry {
        ArchiveEntry { name: name.to_string(), is_dir: false, children: Vec::new() }
    }

    fn ctx(word_size: WordSize, game_dir: &Path) -> RouteContext<'_> {
        RouteContext { word_size, in_game_folder: "tf", fgd_file: "tf.fgd", game_dir }
    }

    fn release_entries() -> Vec<ArchiveEntry> {
        vec![
            dir("win64", &["postcompiler"]),
            dir("hammer", &["cfg", "scripts"]),
            dir("instances", &["tf", "portal2"]),
            file("tf.fgd"),
            file("README.md"),
        ]
    }

    #[test]
    fn test_full_release_on_64bit_host() {
        let game_dir = PathBuf::from("/games/Team Fortress 2");
        let plans = plan_routes(&release_entries(), &ctx(WordSize::Bits64, &game_dir));

        assert_eq!(plans.len(), 4);
        let dests: Vec<_> = plans.iter().map(|p| p.dest.clone()).collect();
        assert!(dests.contains(&game_dir.join("bin/postcompiler")));
        assert!(dests.contains(&game_dir.join("hammer")));
        assert!(dests.contains(&game_dir.join("sdk_content/maps/instances")));
        assert!(dests.contains(&game_dir.join("bin")));
    }

    #[test]
    fn test_win64_skipped_on_32bit_host() {
        let game_dir = PathBuf::from("/games/Team Fortress 2");
        let plans = plan_routes(&release_entries(), &ctx(WordSize::Bits32, &game_dir));
        assert_eq!(plans.len(), 3);
        assert!(!plans.iter().any(|p| p.source.starts_with("win64")));
    }

    #[test]
    fn test_binaries_copy_nested_subfolder_only() {
        let game_dir = PathBuf::from("/g");
        let plans = plan_routes(
            &[dir("win64", &["postcompiler", "vrad"])],
            &ctx(WordSize::Bits64, &game_dir),
        );
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].source, PathBuf::from("win64/postcompiler"));
        assert_eq!(plans[0].dest, game_dir.join("bin/postcompiler"));
    }

    #[test]
    fn test_binaries_folder_without_tool_ignored() {
        let game_dir = PathBuf::from("/g");
        let plans = plan_routes(&[dir("win64", &["vrad"])], &ctx(WordSize::Bits64, &game_dir));
        assert!(plans.is_empty());
    }

    #[test]
    fn test_instances_require_game_subfolder() {
        let game_dir = PathBuf::from("/g");
        let plans = plan_routes(
            &[dir("instances", &["portal2"])],
            &ctx(WordSize::Bits64, &game_dir),
        );
        assert!(plans.is_empty());
    }

    #[test]
    fn test_unknown_entries_ignored() {
        let game_dir = PathBuf::from("/g");
        let plans = plan_routes(
            &[file("LICENSE"), dir("docs", &["index.html"])],
            &ctx(WordSize::Bits64, &game_dir),
        );
        assert!(plans.is_empty());
    }

    #[test]
    fn test_apply_routes_copies_files() {
        let extracted = tempfile::tempdir().unwrap();
        let game = tempfile::tempdir().unwrap();

        fs::create_dir_all(extracted.path().join("win64/postcompiler")).unwrap();
        fs::write(
            extracted.path().join("win64/postcompiler/postcompiler.exe"),
            b"exe",
        )
        .unwrap();
        fs::create_dir_all(extracted.path().join("hammer/cfg")).unwrap();
        fs::write(extracted.path().join("hammer/cfg/filter.txt"), b"cfg").unwrap();
        fs::create_dir_all(extracted.path().join("instances/tf")).unwrap();
        fs::write(extracted.path().join("instances/tf/spawn.vmf"), b"vmf").unwrap();
        fs::write(extracted.path().join("tf.fgd"), b"fgd").unwrap();
        fs::write(extracted.path().join("README.md"), b"skip me").unwrap();

        let ctx = ctx(WordSize::Bits64, game.path());
        let plans = apply_routes(extracted.path(), &ctx).unwrap();
        assert_eq!(plans.len(), 4);

        assert!(game.path().join("bin/postcompiler/postcompiler.exe").is_file());
        assert!(game.path().join("hammer/cfg/filter.txt").is_file());
        assert!(game.path().join("sdk_content/maps/instances/tf/spawn.vmf").is_file());
        assert!(game.path().join("bin/tf.fgd").is_file());
        assert!(!game.path().join("README.md").exists());
    }
}
