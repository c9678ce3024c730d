//! Minimal server-sent-events decoder for the Streamable HTTP transport.
//!
//! An MCP server answering over `text/event-stream` sends a finite sequence
//! of events, each carrying one JSON-RPC message in its `data` field. The
//! decoder is a lazy iterator over a reader, so a server that streams partial
//! progress is consumed event by event instead of buffered whole.

use std::io::BufRead;

/// Iterator over the `data` payloads of an SSE stream.
///
/// Comment lines (`:`) and non-`data` fields (`event`, `id`, `retry`) are
/// skipped; multi-line `data` fields are joined with newlines per the SSE
/// format. A trailing event not terminated by a blank line is still yielded.
pub struct SseEvents<R: BufRead> {
    reader: R,
    done: bool,
}

impl<R: BufRead> SseEvents<R> {
    /// Decode events from the given reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for SseEvents<R> {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut data: Vec<String> = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.done = true;
                    if data.is_empty() {
                        return None;
                    }
                    return Some(Ok(data.join("\n")));
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }

            let trimmed = line.trim_end_matches(['\r', '\n']);

            // Blank line dispatches the accumulated event.
            if trimmed.is_empty() {
                if data.is_empty() {
                    continue;
                }
                return Some(Ok(data.join("\n")));
            }

            // Comment line.
            if trimmed.starts_with(':') {
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix("data:") {
                data.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            }
            // Other fields (event, id, retry) carry no JSON-RPC payload.
        }
    }
}
