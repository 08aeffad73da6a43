use crate::models::FlowRecord;
use tracing::{debug, warn};

/// Characters a table separator row is made of.
const BORDER_CHARS: &[char] = &['+', '-', '|', '=', ':', ' ', '\t'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    SeekingHeader,
    InData,
    Done,
}

/// Lazy iterator over the flow rows of one decoded result file.
///
/// Pure over its input: parsing the same text twice yields the same rows.
pub struct FlowRows<'a> {
    target: &'a str,
    lines: std::str::Lines<'a>,
    state: ParseState,
    line_no: usize,
    malformed: usize,
}

/// Parse the engine's tabular text output for `target`.
pub fn parse<'a>(target: &'a str, text: &'a str) -> FlowRows<'a> {
    FlowRows {
        target,
        lines: text.lines(),
        state: ParseState::SeekingHeader,
        line_no: 0,
        malformed: 0,
    }
}

impl<'a> FlowRows<'a> {
    /// Rows dropped so far for having too few fields or an empty source/sink.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.next()?;
        self.line_no += 1;
        Some(line)
    }
}

impl Iterator for FlowRows<'_> {
    type Item = FlowRecord;

    fn next(&mut self) -> Option<FlowRecord> {
        loop {
            match self.state {
                ParseState::Done => return None,
                ParseState::SeekingHeader => {
                    let Some(line) = self.next_line() else {
                        self.state = ParseState::Done;
                        continue;
                    };
                    if is_header(line) {
                        debug!(target = %self.target, line = self.line_no, "Found result table header");
                        self.state = ParseState::InData;
                    }
                }
                ParseState::InData => {
                    let Some(line) = self.next_line() else {
                        self.state = ParseState::Done;
                        continue;
                    };
                    if line.trim().is_empty() {
                        self.state = ParseState::Done;
                        continue;
                    }
                    if is_separator(line) {
                        continue;
                    }
                    match split_row(line) {
                        Some((source, sink, extra)) => {
                            return Some(FlowRecord {
                                target: self.target.to_string(),
                                source,
                                sink,
                                extra,
                            });
                        }
                        None => {
                            self.malformed += 1;
                            warn!(
                                target = %self.target,
                                line = self.line_no,
                                row = %line.trim(),
                                "Dropping malformed result row"
                            );
                        }
                    }
                }
            }
        }
    }
}

fn is_header(line: &str) -> bool {
    if !line.contains('|') {
        return false;
    }
    let fields: Vec<String> = line.split('|').map(|f| f.trim().to_lowercase()).collect();
    let has_source = fields.iter().any(|f| f.contains("source"));
    let has_sink = fields.iter().any(|f| f.contains("sink") || f.contains("col1"));
    has_source && has_sink
}

fn is_separator(line: &str) -> bool {
    line.chars().all(|c| BORDER_CHARS.contains(&c))
}

fn split_row(line: &str) -> Option<(String, String, Vec<String>)> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);

    let fields: Vec<String> = inner.split('|').map(|f| f.trim().to_string()).collect();
    if fields.len() < 3 {
        return None;
    }
    let mut fields = fields.into_iter();
    let source = fields.next()?;
    let middle = fields.next()?;
    let sink = fields.next()?;
    if source.is_empty() || sink.is_empty() {
        return None;
    }
    let mut extra = vec![middle];
    extra.extend(fields);
    Some((source, sink, extra))
}
