//! `invoicedesk-search`: keeps a search box and the page URL in sync.
//!
//! Typing is debounced; when the user pauses, the current location's query
//! parameters are rewritten (`page` reset to 1, `query` set or removed) and
//! the URL is replaced without adding a history entry.

pub mod debounce;
pub mod params;
pub mod search_box;

pub use debounce::Debouncer;
pub use params::{apply_search_term, Location, SearchParams, PAGE_PARAM, QUERY_PARAM};
pub use search_box::{Navigator, SearchBox, DEFAULT_WAIT};
