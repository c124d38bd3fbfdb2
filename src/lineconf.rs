//! Line-oriented patching for gameinfo.txt and srctools.vdf
//!
//! Both files are edited the same way: keep every untouched line exactly as
//! it was (endings and indentation included), scan from the bottom up so the
//! most recently added matching line wins, and only write the file back when
//! something actually changed.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

// ============================================================================
// Line document
// ============================================================================

/// A text file held as its original lines, endings preserved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDocument {
    lines: Vec<String>,
    dirty: bool,
}

/// Why a document could not be loaded
#[derive(Debug)]
pub enum LineConfigError {
    /// The file is missing (fatal for both patched files)
    NotFound { path: String },
    /// The file exists but is not valid UTF-8 text
    NotText { path: String },
    Io { path: String, source: io::Error },
}

impl fmt::Display for LineConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineConfigError::NotFound { path } => write!(f, "couldn't find the file '{}'", path),
            LineConfigError::NotText { path } => {
                write!(f, "'{}' is not decodable as text", path)
            }
            LineConfigError::Io { path, source } => write!(f, "error reading '{}': {}", path, source),
        }
    }
}

impl std::error::Error for LineConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LineConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result of one patch pass over a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePatch {
    /// A line was inserted or replaced; the document must be written back
    Applied,
    /// The desired state was already present; nothing to write
    NoChangeNeeded,
    /// Neither the desired state nor the anchor line exists
    AnchorMissing,
}

impl LineDocument {
    /// Load a document from disk.
    pub fn load(path: &Path) -> Result<Self, LineConfigError> {
        let display = path.display().to_string();
        let raw = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LineConfigError::NotFound { path: display.clone() },
            _ => LineConfigError::Io { path: display.clone(), source: e },
        })?;
        let text = String::from_utf8(raw)
            .map_err(|_| LineConfigError::NotText { path: display })?;
        Ok(Self::from_text(&text))
    }

    /// Split text into lines with their endings kept in place
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(str::to_string).collect(),
            dirty: false,
        }
    }

    /// Whether any patch pass mutated the document
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Reassemble the document into file contents
    pub fn to_text(&self) -> String {
        self.lines.concat()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Write the document back, but only if a patch changed it.
    pub fn save_if_dirty(&self, path: &Path) -> Result<bool, LineConfigError> {
        if !self.dirty {
            return Ok(false);
        }
        fs::write(path, self.to_text()).map_err(|e| LineConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Directive-append mode (gameinfo.txt)
    // ------------------------------------------------------------------

    /// Insert `directive` on its own line directly after the sentinel line,
    /// unless some line already carries every one of `required_tokens`
    /// (case-insensitive, comments stripped).
    ///
    /// The new line copies the sentinel's indentation and line ending.
    /// Scans bottom-up; stops at the first line that decides the outcome.
    pub fn append_directive(
        &mut self,
        sentinel: &str,
        required_tokens: &[&str],
        directive: &str,
    ) -> LinePatch {
        for index in (0..self.lines.len()).rev() {
            let stripped = clean_line(&self.lines[index]);
            let lowered = stripped.to_ascii_lowercase();

            if required_tokens
                .iter()
                .all(|token| lowered.contains(&token.to_ascii_lowercase()))
            {
                return LinePatch::NoChangeNeeded;
            }

            if stripped.contains(sentinel) {
                let indent = leading_indent(&self.lines[index]);
                let ending = line_ending(&self.lines[index]);
                self.lines
                    .insert(index + 1, format!("{}{}{}", indent, directive, ending));
                self.dirty = true;
                return LinePatch::Applied;
            }
        }
        LinePatch::AnchorMissing
    }

    // ------------------------------------------------------------------
    // Key-replace mode (srctools.vdf)
    // ------------------------------------------------------------------

    /// Replace the bottom-most line carrying `key_token` with
    /// `desired_pair`, keeping that line's indentation and ending.
    ///
    /// A line that already holds `desired_pair` wins first and leaves the
    /// document untouched. A missing key is not an error: the file is
    /// assumed to simply lack the section.
    pub fn replace_key(&mut self, key_token: &str, desired_pair: &str) -> LinePatch {
        for index in (0..self.lines.len()).rev() {
            let stripped = clean_line(&self.lines[index]);

            if stripped.contains(desired_pair) {
                return LinePatch::NoChangeNeeded;
            }

            // Bottom-up scan means a duplicated key resolves to the last
            // line in the file; see DESIGN.md.
            if stripped.contains(key_token) {
                let indent = leading_indent(&self.lines[index]);
                let ending = line_ending(&self.lines[index]);
                self.lines[index] = format!("{}{}{}", indent, desired_pair, ending);
                self.dirty = true;
                return LinePatch::Applied;
            }
        }
        LinePatch::AnchorMissing
    }
}

// ============================================================================
// Line helpers
// ============================================================================

/// Strip a `//` comment and surrounding whitespace for matching purposes.
/// The stored line is never mutated by this.
pub fn clean_line(line: &str) -> &str {
    let uncommented = match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    };
    uncommented.trim()
}

/// The leading spaces/tabs of a line
pub fn leading_indent(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

/// The trailing newline sequence of a line, if it has one
fn line_ending(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}
