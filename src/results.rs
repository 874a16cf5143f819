use std::collections::VecDeque;
use tracing::info;

use crate::view::Element;

/// Number of status lines kept on screen.
pub const RESULT_LOG_SIZE: usize = 4;

const EMPHASIS: &str = "text-neutral-100";

/// Bounded history of human-readable status lines, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ResultLog {
    entries: VecDeque<String>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line, evicting the oldest once the log is full.
    pub fn push(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!(target: "ytqueuer::results", "{}", text);
        self.entries.push_back(text);
        while self.entries.len() > RESULT_LOG_SIZE {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Only the most recent line carries the emphasis class.
    pub fn render(&self) -> Element {
        let mut root = Element::new("div", &["flex", "flex-col", "pl-3", "pt-2", "text-sm"]);
        let last = self.entries.len().saturating_sub(1);
        for (i, text) in self.entries.iter().enumerate() {
            let classes: &[&str] = if i == last { &[EMPHASIS] } else { &[] };
            root.append(Element::new("span", classes).child(text.as_str()));
        }
        root
    }
}
