use crate::{DisplayPage, PageEvent, PaginateError, MIN_PAGE_LEN, PAGE_PLACEHOLDER};

/// Page state machine over decoded stream text.
///
/// Holds a single live buffer. Text is appended while the buffer stays under
/// `max_page_len` characters; otherwise the buffer is frozen with
/// [`PageEvent::NewPage`] and the incoming text seeds the next page. Text
/// longer than a whole page is cut at character boundaries so no emitted page
/// exceeds the bound.
#[derive(Debug)]
pub struct Paginator {
    max_page_len: usize,
    buffer: String,
    buffer_chars: usize,
    index: usize,
    received: bool,
}

impl Paginator {
    pub fn new(max_page_len: usize) -> Self {
        Self {
            max_page_len: max_page_len.max(MIN_PAGE_LEN),
            buffer: String::new(),
            buffer_chars: 0,
            index: 0,
            received: false,
        }
    }

    pub fn max_page_len(&self) -> usize {
        self.max_page_len
    }

    pub fn received_any(&self) -> bool {
        self.received
    }

    pub fn push(&mut self, text: &str) -> Vec<PageEvent> {
        if text.is_empty() {
            return Vec::new();
        }
        self.received = true;

        let incoming = text.chars().count();
        if self.buffer_chars + incoming < self.max_page_len {
            self.buffer.push_str(text);
            self.buffer_chars += incoming;
            return vec![PageEvent::Update(self.render())];
        }

        let mut events = Vec::new();
        if self.buffer_chars > 0 {
            events.push(PageEvent::NewPage(self.freeze()));
        }
        let mut rest = text;
        loop {
            let (head, head_chars, tail) = split_at_chars(rest, self.max_page_len);
            self.buffer.push_str(head);
            self.buffer_chars = head_chars;
            if tail.is_empty() {
                events.push(PageEvent::Update(self.render()));
                break;
            }
            events.push(PageEvent::NewPage(self.freeze()));
            rest = tail;
        }
        events
    }

    /// Closes the sequence. Only a stream that never delivered text produces
    /// an event: a terminal page reporting the empty stream.
    pub fn finish(&mut self, stream_url: &str) -> Option<PageEvent> {
        if self.received {
            return None;
        }
        Some(PageEvent::Update(DisplayPage {
            index: self.index,
            content: empty_stream_message(stream_url, self.max_page_len),
            is_placeholder: false,
            is_final: true,
        }))
    }

    fn render(&self) -> DisplayPage {
        let is_placeholder = self.buffer.trim().is_empty();
        DisplayPage {
            index: self.index,
            content: if is_placeholder {
                PAGE_PLACEHOLDER.to_string()
            } else {
                self.buffer.clone()
            },
            is_placeholder,
            is_final: false,
        }
    }

    fn freeze(&mut self) -> DisplayPage {
        let page = self.render();
        self.buffer.clear();
        self.buffer_chars = 0;
        self.index += 1;
        page
    }
}

fn split_at_chars(text: &str, max_chars: usize) -> (&str, usize, &str) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (&text[..byte_index], max_chars, &text[byte_index..]),
        None => (text, text.chars().count(), ""),
    }
}

/// The stream URL leads the message, so shortening only ever drops the
/// fixed wording. The URL itself is cut only when it cannot fit on a page.
fn empty_stream_message(stream_url: &str, max_chars: usize) -> String {
    let message = PaginateError::StreamEmpty {
        stream_url: stream_url.to_string(),
    }
    .to_string();
    if message.chars().count() <= max_chars {
        return message;
    }
    let url_chars = stream_url.chars().count();
    if url_chars >= max_chars {
        return truncate_to_page(stream_url, max_chars);
    }
    message.chars().take(max_chars).collect()
}

/// Shortens `value` to at most `max_chars` characters, marking the cut.
pub fn truncate_to_page(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let keep = max_chars.saturating_sub(PAGE_PLACEHOLDER.len());
    let mut truncated = value.chars().take(keep).collect::<String>();
    truncated.push_str(PAGE_PLACEHOLDER);
    truncated
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn run(max_page_len: usize, chunks: &[&str]) -> Vec<PageEvent> {
        let mut paginator = Paginator::new(max_page_len);
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(paginator.push(chunk));
        }
        events.extend(paginator.finish("https://stream/test"));
        events
    }

    /// Last rendering of every page, in index order.
    fn final_pages(events: &[PageEvent]) -> Vec<DisplayPage> {
        let mut pages = BTreeMap::new();
        for event in events {
            let page = event.page();
            pages.insert(page.index, page.clone());
        }
        pages.into_values().collect()
    }

    fn concat_text(events: &[PageEvent]) -> String {
        final_pages(events)
            .into_iter()
            .filter(|page| !page.is_placeholder)
            .map(|page| page.content)
            .collect()
    }

    #[test]
    fn unit_small_chunks_update_one_live_page() {
        let events = run(16, &["abc", "def"]);
        assert_eq!(
            events,
            vec![
                PageEvent::Update(DisplayPage {
                    index: 0,
                    content: "abc".to_string(),
                    is_placeholder: false,
                    is_final: false,
                }),
                PageEvent::Update(DisplayPage {
                    index: 0,
                    content: "abcdef".to_string(),
                    is_placeholder: false,
                    is_final: false,
                }),
            ]
        );
    }

    #[test]
    fn unit_overflow_freezes_buffer_and_seeds_next_page() {
        let events = run(16, &["aaaaaaaaaa", "bbbbbb"]);
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], PageEvent::NewPage(DisplayPage {
            index: 0,
            content: "aaaaaaaaaa".to_string(),
            is_placeholder: false,
            is_final: false,
        }));
        assert_eq!(events[2].page().index, 1);
        assert_eq!(events[2].page().content, "bbbbbb");
        assert!(!events[2].freezes_page());
    }

    #[test]
    fn functional_conservation_holds_across_chunkings() {
        let text: String = (0..40)
            .map(|line| format!("step {line}: ok\n"))
            .collect();
        for chunk_size in [1usize, 3, 7, 15] {
            let chars = text.chars().collect::<Vec<_>>();
            let chunks = chars
                .chunks(chunk_size)
                .map(|chunk| chunk.iter().collect::<String>())
                .collect::<Vec<_>>();
            let chunk_refs = chunks.iter().map(String::as_str).collect::<Vec<_>>();
            let events = run(64, &chunk_refs);
            assert_eq!(concat_text(&events), text, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn functional_every_page_respects_bound_with_oversized_chunk() {
        let oversized = "x".repeat(100);
        let events = run(16, &["head", oversized.as_str(), "tail"]);
        for event in &events {
            assert!(
                event.page().content.chars().count() <= 16,
                "page too long: {:?}",
                event
            );
        }
        assert_eq!(concat_text(&events), format!("head{oversized}tail"));
    }

    #[test]
    fn functional_multibyte_text_is_bounded_by_characters() {
        let text = "✓".repeat(40);
        let events = run(16, &[text.as_str()]);
        for page in final_pages(&events) {
            assert!(page.content.chars().count() <= 16);
        }
        assert_eq!(concat_text(&events), text);
    }

    #[test]
    fn unit_new_page_precedes_updates_for_next_index() {
        let events = run(16, &["0123456789", "abcdefghij", "klm"]);
        let mut last_index = 0;
        let mut frozen = Vec::new();
        for event in &events {
            let index = event.page().index;
            assert!(index >= last_index, "indices must not decrease");
            assert!(!frozen.contains(&index), "frozen page {index} re-rendered");
            if event.freezes_page() {
                frozen.push(index);
            }
            last_index = index;
        }
        assert_eq!(frozen, vec![0]);
    }

    #[test]
    fn regression_whitespace_only_buffer_renders_placeholder() {
        let events = run(16, &["   ", "\n"]);
        assert_eq!(events.len(), 2);
        let last = final_pages(&events).pop().expect("page");
        assert!(last.is_placeholder);
        assert_eq!(last.content, PAGE_PLACEHOLDER);
        assert!(!last.is_final);
    }

    #[test]
    fn regression_whitespace_page_frozen_as_placeholder() {
        let spaces = " ".repeat(12);
        let events = run(16, &[spaces.as_str(), "build output"]);
        assert_eq!(events[1], PageEvent::NewPage(DisplayPage {
            index: 0,
            content: PAGE_PLACEHOLDER.to_string(),
            is_placeholder: true,
            is_final: false,
        }));
        assert_eq!(events[2].page().content, "build output");
    }

    #[test]
    fn regression_zero_byte_stream_yields_single_terminal_page() {
        let events = run(64, &[]);
        assert_eq!(events.len(), 1);
        let page = events[0].page();
        assert!(page.is_final);
        assert_eq!(page.index, 0);
        assert!(page.content.contains("https://stream/test"));
    }

    #[test]
    fn regression_empty_chunks_do_not_count_as_output() {
        let events = run(64, &["", ""]);
        assert_eq!(events.len(), 1);
        assert!(events[0].page().is_final);
    }

    #[test]
    fn unit_terminal_page_is_truncated_to_bound() {
        let mut paginator = Paginator::new(16);
        let event = paginator
            .finish(&format!("https://stream/{}", "a".repeat(200)))
            .expect("terminal page");
        assert_eq!(event.page().content.chars().count(), 16);
        assert!(event.page().content.ends_with(PAGE_PLACEHOLDER));
    }

    #[test]
    fn regression_terminal_page_keeps_url_when_wording_is_shortened() {
        for url in ["https://s/b-42", "https://s/b-4242", "<none>"] {
            let mut paginator = Paginator::new(MIN_PAGE_LEN);
            let event = paginator.finish(url).expect("terminal page");
            let content = &event.page().content;
            assert!(content.chars().count() <= MIN_PAGE_LEN, "{content:?}");
            assert!(content.starts_with(url), "{content:?} lost {url}");
        }

        let url = format!("https://builds.example.com/streams/{}", "f".repeat(20));
        let mut paginator = Paginator::new(64);
        let content = paginator.finish(&url).expect("terminal page").into_page().content;
        assert_eq!(content.chars().count(), 64);
        assert!(content.starts_with(&url));
    }

    #[test]
    fn unit_max_page_len_is_clamped_to_minimum() {
        assert_eq!(Paginator::new(1).max_page_len(), MIN_PAGE_LEN);
        assert_eq!(Paginator::new(500).max_page_len(), 500);
    }
}
