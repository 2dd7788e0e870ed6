//! Decoding of ffmpeg's `-progress` stream.
//!
//! ffmpeg posts blocks of `key=value` lines, each block closed by a
//! `progress=continue` or `progress=end` line:
//!
//! ```text
//! frame=120
//! fps=24.0
//! drop_frames=0
//! progress=continue
//! ```

use serde::Serialize;

/// The `progress=` value closing a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Continue,
    End,
    Other(String),
}

impl RunState {
    fn parse(value: &str) -> Self {
        match value {
            "continue" => RunState::Continue,
            "end" => RunState::End,
            other => RunState::Other(other.to_string()),
        }
    }

    /// Anything other than `continue` means the reporting process is done.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Continue)
    }
}

/// One decoded progress snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressStatus {
    pub frame: u64,
    pub dropped_frames: u64,
    /// `None` only for a trailing block that was cut off before its
    /// `progress=` line.
    pub state: Option<RunState>,
}

/// Incremental decoder fed with arbitrary byte chunks.
///
/// Lines may be split across chunks; bytes after the last newline are kept
/// until the next chunk (or [`finish`](StatusDecoder::finish)) completes them.
#[derive(Debug, Default)]
pub struct StatusDecoder {
    buf: Vec<u8>,
    pending: ProgressStatus,
    dirty: bool,
}

impl StatusDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk and return every snapshot it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ProgressStatus> {
        self.buf.extend_from_slice(chunk);

        let mut completed = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(status) = self.apply_line(&line) {
                completed.push(status);
            }
        }
        completed
    }

    /// Flush at end of stream: an unterminated final line is applied, and a
    /// block that never saw its `progress=` line is returned as-is.
    pub fn finish(mut self) -> Option<ProgressStatus> {
        if !self.buf.is_empty() {
            let line = std::mem::take(&mut self.buf);
            if let Some(status) = self.apply_line(&line) {
                return Some(status);
            }
        }
        self.dirty.then_some(self.pending)
    }

    fn apply_line(&mut self, raw: &[u8]) -> Option<ProgressStatus> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();

        let mut parts = line.split('=');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return None;
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "frame" => {
                self.pending.frame = value.parse().unwrap_or(self.pending.frame);
                self.dirty = true;
            }
            "drop_frames" => {
                self.pending.dropped_frames = value.parse().unwrap_or(self.pending.dropped_frames);
                self.dirty = true;
            }
            "progress" => {
                self.pending.state = Some(RunState::parse(value));
                self.dirty = false;
                return Some(std::mem::take(&mut self.pending));
            }
            _ => {}
        }
        None
    }
}
