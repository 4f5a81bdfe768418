use crate::{api::PAGE_SIZE, ActionKey, Error, ValidationError};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PagerState {
    Idle,
    Loading(u32),
}

/// Forward-only paging over one lesson's comments: page 1, then each next page
/// while the server reports more, never two loads at once.
///
/// Pages are offsets on the server side, so deleting a loaded comment slides
/// the first unseen one back onto a loaded page. `removed` tracks this and
/// makes the next load start from the page that comment now sits on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pager {
    state: PagerState,

    /// Last loaded page, 0 before the first load
    page: u32,

    /// Number of pages the server last reported
    pages: u32,

    /// Loaded comments deleted since the last load
    removed: u32,
}

impl Default for Pager {
    fn default() -> Pager {
        Pager::new()
    }
}

impl Pager {
    pub fn new() -> Pager {
        Pager {
            state: PagerState::Idle,
            page: 0,
            pages: 0,
            removed: 0,
        }
    }

    pub fn state(&self) -> PagerState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, PagerState::Loading(_))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn pages(&self) -> u32 {
        self.pages
    }

    pub fn has_more(&self) -> bool {
        self.page < self.pages
    }

    /// Page holding the first comment not loaded yet
    pub fn next_page(&self) -> u32 {
        (self.page * PAGE_SIZE).saturating_sub(self.removed) / PAGE_SIZE + 1
    }

    /// Records the deletion of a loaded comment
    pub fn note_removed(&mut self) {
        self.removed += 1;
    }

    /// Page 1 may always be (re)loaded, any other page must be `next_page`
    pub fn begin(&mut self, page: u32) -> Result<(), Error> {
        if self.is_loading() {
            return Err(Error::Busy(ActionKey::LoadPage));
        }
        if page == 0 || (page != 1 && page != self.next_page()) {
            return Err(Error::Validation(ValidationError::InvalidPage {
                requested: page,
                loaded: self.page,
            }));
        }
        if page != 1 && !self.has_more() {
            return Err(Error::NoMorePages);
        }
        self.state = PagerState::Loading(page);
        Ok(())
    }

    /// Starts loading the first page with unseen comments
    pub fn begin_next(&mut self) -> Result<u32, Error> {
        let next = self.next_page();
        self.begin(next)?;
        Ok(next)
    }

    pub fn finish(&mut self, page: u32, pages: u32) {
        if self.state != PagerState::Loading(page) {
            tracing::warn!(
                state = ?self.state,
                page,
                "finished loading a page that was not requested"
            );
        }
        self.state = PagerState::Idle;
        self.page = page;
        self.pages = pages;
        self.removed = 0;
    }

    /// Leaves everything but the loading state untouched
    pub fn fail(&mut self) {
        self.state = PagerState::Idle;
    }

    pub fn reset(&mut self) {
        *self = Pager::new();
    }
}
