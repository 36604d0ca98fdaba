use client_core::{Route, ViewRenderer};

/// Collects a line per rendered view for the shell to print.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    pending: Vec<String>,
}

impl TerminalRenderer {
    /// Take the lines rendered since the last call.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }
}

impl ViewRenderer for TerminalRenderer {
    fn render(&mut self, route: &Route) {
        self.pending.push(format!("[{}] {}", route.view, route.path));
    }
}
