//! Terminal renderer: pages are contiguous log text, so edits print only the
//! characters appended since the last rendering.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use ferry_chat::{PageHandle, PageSink, SinkError};

const TERMINAL_MAX_PAGE_CHARS: usize = usize::MAX;

struct TerminalState<W> {
    out: W,
    /// What each page currently shows, indexed by handle.
    shown: Vec<String>,
}

pub struct TerminalPageSink<W> {
    state: Mutex<TerminalState<W>>,
}

impl TerminalPageSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalPageSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: Mutex::new(TerminalState {
                out,
                shown: Vec::new(),
            }),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        match self.state.into_inner() {
            Ok(state) => state.out,
            Err(poisoned) => poisoned.into_inner().out,
        }
    }
}

#[async_trait]
impl<W: Write + Send> PageSink for TerminalPageSink<W> {
    async fn send_page(&self, content: &str) -> Result<PageHandle, SinkError> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.out.write_all(content.as_bytes())?;
        state.out.flush()?;
        state.shown.push(content.to_string());
        Ok(PageHandle((state.shown.len() - 1).to_string()))
    }

    async fn edit_page(&self, handle: &PageHandle, content: &str) -> Result<(), SinkError> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let index = handle
            .as_str()
            .parse::<usize>()
            .ok()
            .filter(|index| *index < state.shown.len())
            .ok_or_else(|| {
                SinkError::InvalidConfig(format!("unknown terminal page '{}'", handle.as_str()))
            })?;
        let previous = std::mem::take(&mut state.shown[index]);
        match content.strip_prefix(previous.as_str()) {
            Some(appended) => state.out.write_all(appended.as_bytes())?,
            None => {
                state.out.write_all(b"\n")?;
                state.out.write_all(content.as_bytes())?;
            }
        }
        state.out.flush()?;
        state.shown[index] = content.to_string();
        Ok(())
    }

    fn max_content_chars(&self) -> usize {
        TERMINAL_MAX_PAGE_CHARS
    }

    /// Pages print as contiguous text, so a placeholder would corrupt it.
    fn shows_placeholder(&self) -> bool {
        false
    }
}
