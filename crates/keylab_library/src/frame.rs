use std::fmt;

/// One complete MIDI message, exactly as the transport delivered it.
///
/// SysEx reassembly (waiting for the trailing `F7`) is the transport's job;
/// a `RawFrame` is never modified after it is built.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct RawFrame(Vec<u8>);

impl RawFrame {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.0.starts_with(prefix)
    }

    /// True if the bytes, read one byte per character, contain `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        let needle = needle.as_bytes();
        if needle.is_empty() {
            return true;
        }
        self.0.windows(needle.len()).any(|w| w == needle)
    }

    /// A cursor over the frame starting at `start` (clamped to the frame length).
    pub fn cursor(&self, start: usize) -> Cursor<'_> {
        Cursor {
            bytes: &self.0,
            pos: start.min(self.0.len()),
        }
    }
}

impl From<Vec<u8>> for RawFrame {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for RawFrame {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for RawFrame {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawFrame[{self}]")
    }
}

/// Forward-only position over a frame's bytes.
///
/// Lookups that fail leave the position where it was, so a missing field
/// never hides the fields after it.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Index of the next occurrence of `byte` at or after the current position.
    pub fn find(&self, byte: u8) -> Option<usize> {
        self.bytes[self.pos..]
            .iter()
            .position(|&b| b == byte)
            .map(|offset| self.pos + offset)
    }

    /// Index of the first byte at or after `from` that is one of `terminators`.
    fn find_any(&self, from: usize, terminators: &[u8]) -> Option<usize> {
        self.bytes
            .get(from..)?
            .iter()
            .position(|b| terminators.contains(b))
            .map(|offset| from + offset)
    }

    /// Finds `marker`, returns the bytes between it and the next terminator and
    /// moves past that terminator.
    ///
    /// Returns `None` without moving if the marker is absent or its run is
    /// never terminated.
    pub fn field_after(&mut self, marker: u8, terminators: &[u8]) -> Option<&'a [u8]> {
        let start = self.find(marker)? + 1;
        let end = self.find_any(start, terminators)?;
        self.pos = (end + 1).min(self.bytes.len());
        Some(&self.bytes[start..end])
    }
}
