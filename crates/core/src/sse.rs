//! Event assembly for `text/event-stream` bodies.
//!
//! Lines come in already framed; `data:` lines are collected until a blank
//! line dispatches them as one event.

#[derive(Debug, Default)]
pub struct SseEvents {
    data: Vec<String>,
}

impl SseEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line without its terminator; returns the event it completed.
    pub fn line(&mut self, line: &str) -> Option<String> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            return self.dispatch();
        }
        // Comments and other fields (event:, id:, retry:) carry no text.
        if let Some(value) = line.strip_prefix("data:") {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        None
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        self.dispatch()
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data).join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(events: &mut SseEvents, lines: &[&str]) -> Vec<String> {
        lines.iter().filter_map(|line| events.line(line)).collect()
    }

    #[test]
    fn blank_line_dispatches() {
        let mut events = SseEvents::new();
        assert_eq!(
            feed(&mut events, &["data: {\"a\":1}", "", "data:two", ""]),
            vec!["{\"a\":1}", "two"]
        );
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut events = SseEvents::new();
        let lines = [": keep-alive", "event: message", "data: one", "data: two", ""];
        assert_eq!(feed(&mut events, &lines), vec!["one\ntwo"]);
    }

    #[test]
    fn carriage_returns_are_ignored() {
        let mut events = SseEvents::new();
        assert_eq!(feed(&mut events, &["data: x\r", "\r"]), vec!["x"]);
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut events = SseEvents::new();
        assert!(events.line("data: [DONE]").is_none());
        assert_eq!(events.finish().as_deref(), Some("[DONE]"));
        assert_eq!(events.finish(), None);
    }
}
