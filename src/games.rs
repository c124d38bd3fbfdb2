//! Games supported by HammerAddons
//!
//! Maps a game's Steam install folder to the two identifiers the patch
//! steps need: the in-game folder that holds gameinfo.txt, and the FGD
//! file shipped for it in the release archive.

/// One supported game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameInfo {
    /// Folder name under `steamapps/common`
    pub name: &'static str,
    /// Secondary subfolder beneath the install folder ("tf", "portal2", ...)
    pub folder: &'static str,
    /// Entity definition file name in the release archive
    pub fgd_file: &'static str,
}

pub const SUPPORTED_GAMES: &[GameInfo] = &[
    GameInfo { name: "Portal 2", folder: "portal2", fgd_file: "portal2.fgd" },
    GameInfo { name: "Alien Swarm", folder: "swarm", fgd_file: "swarm.fgd" },
    GameInfo { name: "Black Mesa", folder: "blackmesa", fgd_file: "blackmesa.fgd" },
    GameInfo { name: "Counter-Strike Global Offensive", folder: "csgo", fgd_file: "csgo.fgd" },
    GameInfo { name: "Half-Life 2", folder: "hl2", fgd_file: "hl2.fgd" },
    GameInfo { name: "Garry's Mod", folder: "gmod", fgd_file: "gmod.fgd" },
    GameInfo { name: "Infra", folder: "infra", fgd_file: "infra.fgd" },
    GameInfo { name: "Left 4 Dead", folder: "l4d", fgd_file: "l4d.fgd" },
    GameInfo { name: "Left 4 Dead 2", folder: "left4dead2", fgd_file: "left4dead2.fgd" },
    GameInfo { name: "Portal", folder: "portal", fgd_file: "portal.fgd" },
    GameInfo { name: "Team Fortress 2", folder: "tf", fgd_file: "tf.fgd" },
];

/// Look up a supported game by its Steam folder name, case-insensitive.
pub fn lookup(name: &str) -> Option<&'static GameInfo> {
    SUPPORTED_GAMES
        .iter()
        .find(|game| game.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_case_insensitive() {
        let game = lookup("team fortress 2").unwrap();
        assert_eq!(game.folder, "tf");
        assert_eq!(game.fgd_file, "tf.fgd");
    }

    #[test]
    fn test_unknown_game() {
        assert!(lookup("Ricochet").is_none());
    }

    #[test]
    fn test_folders_unique() {
        for (i, a) in SUPPORTED_GAMES.iter().enumerate() {
            for b in &SUPPORTED_GAMES[i + 1..] {
                assert_ne!(a.name, b.name);
                assert_ne!(a.folder, b.folder);
            }
        }
    }
}
