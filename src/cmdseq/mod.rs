//! Hammer command sequences (`CmdSeq.wc`)
//!
//! The build steps Hammer runs on map compile live in a proprietary binary
//! container next to the editor. `codec` reads and writes that container,
//! `patcher` wedges the postcompiler step in behind `$bsp_exe`.

pub mod codec;
pub mod patcher;

pub use codec::{decode, encode, CorruptSequence, EncodeError};
pub use patcher::{ensure_tool_step, PatchOutcome, BSP_SENTINEL, TOOL_MARKER};

/// One build step: an executable plus its argument string.
///
/// The trailing flag fields are legacy Hammer state we never interpret;
/// they are carried through decode/encode untouched so an unmodified
/// record re-encodes byte-for-byte.
#[derive(Debug, Clone)]
pub struct CommandRecord {
    pub enabled: bool,
    /// Non-zero marks a built-in pseudo command (copy/delete/rename/cd).
    pub special: i32,
    pub executable: String,
    pub args: String,
    pub is_long_filename: i32,
    pub ensure_check: i32,
    pub ensure_file: String,
    pub use_proc_win: i32,
    pub no_wait: i32,
}

impl CommandRecord {
    /// A fresh enabled command with default flags, as Hammer would create it
    pub fn new(executable: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            enabled: true,
            special: 0,
            executable: executable.into(),
            args: args.into(),
            is_long_filename: 0,
            ensure_check: 0,
            ensure_file: String::new(),
            use_proc_win: 0,
            no_wait: 0,
        }
    }
}

impl PartialEq for CommandRecord {
    /// Identity is the (executable, args) pair, case-insensitive;
    /// the legacy flags carry no meaning of their own.
    fn eq(&self, other: &Self) -> bool {
        self.executable.eq_ignore_ascii_case(&other.executable)
            && self.args.eq_ignore_ascii_case(&other.args)
    }
}

/// A named, ordered list of build steps. Order is execution order.
#[derive(Debug, Clone)]
pub struct SequenceConfig {
    pub name: String,
    pub commands: Vec<CommandRecord>,
}

/// Everything in one `CmdSeq.wc`: the declared format version plus the
/// configurations in their on-disk order (order is preserved so an
/// untouched container round-trips exactly).
#[derive(Debug, Clone)]
pub struct Sequence {
    pub version: f32,
    pub configs: Vec<SequenceConfig>,
}
