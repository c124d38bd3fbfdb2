//! Binary codec for the `CmdSeq.wc` container
//!
//! The layout mirrors the C structs Hammer serializes directly to disk,
//! including the compiler's alignment padding:
//!
//! - header: 31-byte magic, 1 pad byte, f32 LE version, u32 LE config count
//! - per config: 128-byte NUL-padded name, u32 LE command count, records
//! - record (v0.2+, 804 bytes): u8 enabled, 3 pad bytes, i32 special,
//!   260-byte executable, 260-byte args, i32 is_long_filename,
//!   i32 ensure_check, 260-byte ensure_file, i32 use_proc_win, i32 no_wait
//!
//! Pre-0.2 records lack the trailing no_wait field. Fixed string fields are
//! NUL-terminated; text is treated as single-byte ANSI so every byte value
//! survives a decode/encode round trip.

use std::fmt;

use super::{CommandRecord, Sequence, SequenceConfig};

const MAGIC: &[u8; 31] = b"Worldcraft Command Sequences\r\n\x1a";
const NAME_LEN: usize = 128;
const STRING_LEN: usize = 260;

/// Container versions at or above this carry the no_wait field
const VERSION_WITH_NO_WAIT: f32 = 0.2;

// ============================================================================
// Errors
// ============================================================================

/// A container that cannot be decoded safely
#[derive(Debug)]
pub enum CorruptSequence {
    /// The file does not begin with the Worldcraft magic
    BadMagic,
    /// A declared count points past the end of the buffer
    Truncated { what: &'static str },
    /// A fixed-size text field has no NUL terminator
    Unterminated { what: &'static str },
    /// Bytes remain after the declared configurations were read
    TrailingData { extra: usize },
}

impl fmt::Display for CorruptSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptSequence::BadMagic => {
                write!(f, "not a Worldcraft command sequence file")
            }
            CorruptSequence::Truncated { what } => {
                write!(f, "file ends inside {}", what)
            }
            CorruptSequence::Unterminated { what } => {
                write!(f, "{} field has no terminator", what)
            }
            CorruptSequence::TrailingData { extra } => {
                write!(f, "{} unexpected bytes after the last configuration", extra)
            }
        }
    }
}

impl std::error::Error for CorruptSequence {}

/// A sequence that cannot be represented in the on-disk layout
#[derive(Debug)]
pub enum EncodeError {
    /// A text field exceeds its fixed-size slot (terminator included)
    FieldTooLong { what: &'static str, len: usize, max: usize },
    /// A text field contains a character outside the single-byte range
    UnencodableText { what: &'static str },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::FieldTooLong { what, len, max } => {
                write!(f, "{} is {} chars, limit is {}", what, len, max)
            }
            EncodeError::UnencodableText { what } => {
                write!(f, "{} contains characters outside the ANSI range", what)
            }
        }
    }
}

impl std::error::Error for EncodeError {}

// ============================================================================
// Decoding
// ============================================================================

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], CorruptSequence> {
        if self.data.len() - self.pos < n {
            return Err(CorruptSequence::Truncated { what });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u32(&mut self, what: &'static str) -> Result<u32, CorruptSequence> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i32(&mut self, what: &'static str) -> Result<i32, CorruptSequence> {
        Ok(self.read_u32(what)? as i32)
    }

    fn read_f32(&mut self, what: &'static str) -> Result<f32, CorruptSequence> {
        let bytes = self.take(4, what)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a fixed-size NUL-terminated text field.
    ///
    /// A field filled to the brim with no terminator is rejected: it could
    /// never be re-encoded into the same slot, so accepting it would only
    /// move the failure to write time.
    fn read_string(&mut self, len: usize, what: &'static str) -> Result<String, CorruptSequence> {
        let field = self.take(len, what)?;
        let nul = field
            .iter()
            .position(|&b| b == 0)
            .ok_or(CorruptSequence::Unterminated { what })?;
        // Single-byte ANSI: every byte maps straight to the matching char
        Ok(field[..nul].iter().map(|&b| b as char).collect())
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

/// Decode a full `CmdSeq.wc` container.
pub fn decode(data: &[u8]) -> Result<Sequence, CorruptSequence> {
    let mut r = Reader::new(data);

    if r.take(MAGIC.len(), "header")? != MAGIC {
        return Err(CorruptSequence::BadMagic);
    }
    r.take(1, "header")?; // struct alignment padding
    let version = r.read_f32("header version")?;
    let config_count = r.read_u32("configuration count")?;

    let mut configs = Vec::new();
    for _ in 0..config_count {
        let name = r.read_string(NAME_LEN, "configuration name")?;
        let cmd_count = r.read_u32("command count")?;
        let mut commands = Vec::new();
        for _ in 0..cmd_count {
            commands.push(read_command(&mut r, version)?);
        }
        configs.push(SequenceConfig { name, commands });
    }

    if r.remaining() > 0 {
        return Err(CorruptSequence::TrailingData { extra: r.remaining() });
    }

    Ok(Sequence { version, configs })
}

fn read_command(r: &mut Reader<'_>, version: f32) -> Result<CommandRecord, CorruptSequence> {
    let enabled = r.take(1, "command record")?[0] != 0;
    r.take(3, "command record")?; // struct alignment padding
    let special = r.read_i32("command record")?;
    let executable = r.read_string(STRING_LEN, "command executable")?;
    let args = r.read_string(STRING_LEN, "command arguments")?;
    let is_long_filename = r.read_i32("command record")?;
    let ensure_check = r.read_i32("command record")?;
    let ensure_file = r.read_string(STRING_LEN, "command ensure-file")?;
    let use_proc_win = r.read_i32("command record")?;
    let no_wait = if version >= VERSION_WITH_NO_WAIT {
        r.read_i32("command record")?
    } else {
        0
    };

    Ok(CommandRecord {
        enabled,
        special,
        executable,
        args,
        is_long_filename,
        ensure_check,
        ensure_file,
        use_proc_win,
        no_wait,
    })
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a sequence back into the on-disk layout.
///
/// The declared version and the configuration/command order are written
/// exactly as held in memory, so `encode(decode(bytes)) == bytes` for any
/// well-formed container that was not mutated in between.
pub fn encode(seq: &Sequence) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();

    out.extend_from_slice(MAGIC);
    out.push(0); // struct alignment padding
    out.extend_from_slice(&seq.version.to_le_bytes());
    out.extend_from_slice(&(seq.configs.len() as u32).to_le_bytes());

    for config in &seq.configs {
        write_string(&mut out, &config.name, NAME_LEN, "configuration name")?;
        out.extend_from_slice(&(config.commands.len() as u32).to_le_bytes());
        for cmd in &config.commands {
            write_command(&mut out, cmd, seq.version)?;
        }
    }

    Ok(out)
}

fn write_command(out: &mut Vec<u8>, cmd: &CommandRecord, version: f32) -> Result<(), EncodeError> {
    out.push(cmd.enabled as u8);
    out.extend_from_slice(&[0, 0, 0]); // struct alignment padding
    out.extend_from_slice(&cmd.special.to_le_bytes());
    write_string(out, &cmd.executable, STRING_LEN, "command executable")?;
    write_string(out, &cmd.args, STRING_LEN, "command arguments")?;
    out.extend_from_slice(&cmd.is_long_filename.to_le_bytes());
    out.extend_from_slice(&cmd.ensure_check.to_le_bytes());
    write_string(out, &cmd.ensure_file, STRING_LEN, "command ensure-file")?;
    out.extend_from_slice(&cmd.use_proc_win.to_le_bytes());
    if version >= VERSION_WITH_NO_WAIT {
        out.extend_from_slice(&cmd.no_wait.to_le_bytes());
    }
    Ok(())
}

/// Write a fixed-size NUL-padded text field
fn write_string(
    out: &mut Vec<u8>,
    text: &str,
    len: usize,
    what: &'static str,
) -> Result<(), EncodeError> {
    let chars = text.chars().count();
    if chars >= len {
        return Err(EncodeError::FieldTooLong { what, len: chars, max: len - 1 });
    }

    let start = out.len();
    for c in text.chars() {
        let code = c as u32;
        if code > 0xFF {
            out.truncate(start);
            return Err(EncodeError::UnencodableText { what });
        }
        out.push(code as u8);
    }
    out.resize(start + len, 0);
    Ok(())
}
