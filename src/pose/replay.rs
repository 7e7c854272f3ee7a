use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result};

use super::{PoseFrame, PoseSnapshot, PoseSource};

/// Replays pose frames recorded as JSON lines.
///
/// Each line is either an object mapping joint names to
/// `{"x": .., "y": .., "visibility": ..}` or `null` / blank for a frame in
/// which no body was detected.
pub struct ReplayPoseSource<R> {
    reader: R,
    line_number: usize,
    buffer: String,
}

impl ReplayPoseSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open pose recording {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplayPoseSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buffer: String::new(),
        }
    }

    pub fn frames_read(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> PoseSource for ReplayPoseSource<R> {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>> {
        self.buffer.clear();
        let bytes = self
            .reader
            .read_line(&mut self.buffer)
            .with_context(|| format!("failed to read pose line {}", self.line_number + 1))?;
        if bytes == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let line = self.buffer.trim();
        if line.is_empty() || line == "null" {
            return Ok(Some(PoseFrame::Absent));
        }

        let snapshot: PoseSnapshot = serde_json::from_str(line)
            .with_context(|| format!("invalid pose on line {}", self.line_number))?;
        Ok(Some(PoseFrame::Detected(snapshot)))
    }
}
