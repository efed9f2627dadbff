//! Fenced code detection for line scanners.

/// Open code fence: marker character and run length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Fence {
    marker: char,
    len: usize,
}

/// Tracks whether a line-by-line scan is inside fenced code.
///
/// A fence opens with three or more backticks or tildes and closes with a
/// run of the same marker at least as long, followed only by whitespace.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<Fence>,
}

impl FenceTracker {
    /// Feed the next line. Returns `true` if the line is a fence delimiter or
    /// fenced content, i.e. not prose.
    pub(crate) fn is_code(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        match self.open {
            Some(fence) => {
                if closes(trimmed, fence) {
                    self.open = None;
                }
                true
            }
            None => {
                self.open = opening(trimmed);
                self.open.is_some()
            }
        }
    }
}

fn run_of(trimmed: &str, marker: char) -> usize {
    trimmed.chars().take_while(|&c| c == marker).count()
}

fn opening(trimmed: &str) -> Option<Fence> {
    let marker = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = run_of(trimmed, marker);
    (len >= 3).then_some(Fence { marker, len })
}

fn closes(trimmed: &str, fence: Fence) -> bool {
    let len = run_of(trimmed, fence.marker);
    len >= fence.len && trimmed[len * fence.marker.len_utf8()..].trim().is_empty()
}
