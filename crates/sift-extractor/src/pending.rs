//! The chunk-in-progress: consecutive unmatched lines of one session.

/// Buffered unmatched lines awaiting a flush to the chunk store.
#[derive(Debug, Default)]
pub struct PendingChunk {
    lines: Vec<String>,
}

impl PendingChunk {
    pub fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Close the chunk, yielding each line with the line before it as context.
    pub fn drain(&mut self) -> Vec<(String, Option<String>)> {
        let lines = std::mem::take(&mut self.lines);
        let mut out = Vec::with_capacity(lines.len());
        let mut previous: Option<String> = None;
        for line in lines {
            let context = previous.replace(line.clone());
            out.push((line, context));
        }
        out
    }
}
