//! Dotted version tags as used in HammerAddons release names
//!
//! Release tags come in shapes like "v2.5.1" or "2.0.0-beta"; everything
//! that is not a digit or a dot is noise for ordering purposes.

use std::cmp::Ordering;
use std::fmt;

/// A parsed dotted version, ordered component-wise.
///
/// Missing trailing components compare as zero, so `1.7` == `1.7.0`
/// and `1.7.5` < `1.7.10`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    components: Vec<u32>,
}

/// Error for a tag that has no usable numeric content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFormatError {
    tag: String,
}

impl fmt::Display for VersionFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a usable version tag: '{}'", self.tag)
    }
}

impl std::error::Error for VersionFormatError {}

impl VersionTag {
    /// Parse a version tag, discarding every character that is not a digit
    /// or a dot ("v2.5.1" -> 2.5.1, "2.0.0-beta" -> 2.0.0).
    ///
    /// Fails if any segment is empty after stripping (consecutive dots, or
    /// nothing numeric at all). Callers picking among remote tags should
    /// treat a failed parse as "tag absent", not abort the run.
    pub fn parse(tag: &str) -> Result<Self, VersionFormatError> {
        let stripped: String = tag
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        if stripped.is_empty() {
            return Err(VersionFormatError { tag: tag.to_string() });
        }

        let mut components = Vec::new();
        for segment in stripped.split('.') {
            let value = segment
                .parse::<u32>()
                .map_err(|_| VersionFormatError { tag: tag.to_string() })?;
            components.push(value);
        }

        Ok(Self { components })
    }

    /// The parsed components, most significant first
    pub fn components(&self) -> &[u32] {
        &self.components
    }
}

impl Ord for VersionTag {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                decided => return decided,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for VersionTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", component)?;
            first = false;
        }
        Ok(())
    }
}
