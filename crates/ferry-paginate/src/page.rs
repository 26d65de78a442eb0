#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPage {
    pub index: usize,
    pub content: String,
    /// `content` is [`crate::PAGE_PLACEHOLDER`] standing in for whitespace.
    pub is_placeholder: bool,
    /// Set only on the terminal page of a stream that delivered nothing.
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Re-render the live page in place.
    Update(DisplayPage),
    /// The carried page is frozen; the next event starts a new live page.
    NewPage(DisplayPage),
}

impl PageEvent {
    pub fn page(&self) -> &DisplayPage {
        match self {
            PageEvent::Update(page) | PageEvent::NewPage(page) => page,
        }
    }

    pub fn into_page(self) -> DisplayPage {
        match self {
            PageEvent::Update(page) | PageEvent::NewPage(page) => page,
        }
    }

    pub fn freezes_page(&self) -> bool {
        matches!(self, PageEvent::NewPage(_))
    }
}
