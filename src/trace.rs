use super::*;

#[derive(Debug)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) toggles: bool,
    pub(crate) timers: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
    pub(crate) to_stderr: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            toggles: true,
            timers: true,
            logs: VecDeque::new(),
            log_limit: 10_000,
            to_stderr: true,
        }
    }
}

impl TraceState {
    fn push(&mut self, line: String, echo: bool) {
        if echo && self.to_stderr {
            eprintln!("{line}");
        }
        while self.logs.len() >= self.log_limit {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }

    pub(crate) fn line(&mut self, line: String) {
        if self.enabled {
            self.push(line, true);
        }
    }

    pub(crate) fn toggle_line(&mut self, line: String) {
        if self.enabled && self.toggles {
            self.push(line, true);
        }
    }

    pub(crate) fn timer_line(&mut self, line: String) {
        if self.enabled && self.timers {
            self.push(line, true);
        }
    }

    /// Structural mismatches are always kept; they only reach stderr while
    /// tracing is on.
    pub(crate) fn warn(&mut self, message: String) {
        let echo = self.enabled;
        self.push(format!("[warn] {message}"), echo);
    }
}

impl Page {
    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace.logs.drain(..).collect()
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace.to_stderr = enabled;
    }

    pub fn set_trace_toggles(&mut self, enabled: bool) {
        self.trace.toggles = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace.timers = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::InvalidConfig(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace.log_limit = max_entries;
        while self.trace.logs.len() > self.trace.log_limit {
            self.trace.logs.pop_front();
        }
        Ok(())
    }
}
