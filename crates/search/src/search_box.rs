//! Search input bound to the URL.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::debounce::Debouncer;
use crate::params::{apply_search_term, Location, QUERY_PARAM};

/// Pause after the last keystroke before the URL is rewritten.
pub const DEFAULT_WAIT: Duration = Duration::from_millis(300);

/// Client-side navigation.
pub trait Navigator: Send + Sync {
    /// Swap the current URL for `href` without adding a history entry.
    fn replace(&self, href: &str);
}

impl<N: Navigator + ?Sized> Navigator for Arc<N> {
    fn replace(&self, href: &str) {
        (**self).replace(href)
    }
}

/// Synchronizes a search input with the `query`/`page` URL parameters.
pub struct SearchBox {
    location: Arc<Mutex<Location>>,
    debouncer: Debouncer<String>,
}

impl SearchBox {
    pub fn new<N>(location: Location, navigator: N) -> Self
    where
        N: Navigator + 'static,
    {
        Self::with_wait(location, navigator, DEFAULT_WAIT)
    }

    pub fn with_wait<N>(location: Location, navigator: N, wait: Duration) -> Self
    where
        N: Navigator + 'static,
    {
        let location = Arc::new(Mutex::new(location));
        let current = Arc::clone(&location);
        let debouncer = Debouncer::new(wait, move |term: String| {
            let href = {
                let mut loc = current.lock().unwrap_or_else(PoisonError::into_inner);
                let next = apply_search_term(&loc.params, &term);
                loc.params = next;
                loc.href()
            };
            tracing::debug!(%href, "search term settled");
            navigator.replace(&href);
        });
        Self { location, debouncer }
    }

    /// What the input shows on first render: the URL's `query`, or empty.
    pub fn initial_value(&self) -> String {
        let loc = self.location.lock().unwrap_or_else(PoisonError::into_inner);
        loc.params.get(QUERY_PARAM).unwrap_or_default().to_string()
    }

    /// Record a keystroke; navigation happens once typing pauses.
    pub fn on_input(&self, term: &str) {
        self.debouncer.call(term.to_string());
    }

    /// The URL moved for another reason (e.g. pagination).
    pub fn set_location(&self, location: Location) {
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = location;
    }

    pub fn location(&self) -> Location {
        self.location.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl core::fmt::Debug for SearchBox {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SearchBox")
            .field("location", &self.location())
            .field("debouncer", &self.debouncer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[derive(Default)]
    struct RecordingNavigator {
        replaced: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn replace(&self, href: &str) {
            self.replaced.lock().unwrap().push(href.to_string());
        }
    }

    impl RecordingNavigator {
        fn replaced(&self) -> Vec<String> {
            self.replaced.lock().unwrap().clone()
        }
    }

    fn search_box(href: &str) -> (SearchBox, Arc<RecordingNavigator>) {
        let nav = Arc::new(RecordingNavigator::default());
        (SearchBox::new(Location::parse(href), Arc::clone(&nav)), nav)
    }

    #[tokio::test(start_paused = true)]
    async fn typing_burst_navigates_once_with_last_term() {
        let (sb, nav) = search_box("/dashboard/invoices");

        sb.on_input("a");
        sleep(Duration::from_millis(100)).await;
        sb.on_input("ab");

        sleep(Duration::from_millis(250)).await;
        assert!(nav.replaced().is_empty());

        sleep(Duration::from_millis(100)).await;
        assert_eq!(nav.replaced(), vec!["/dashboard/invoices?page=1&query=ab"]);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_the_box_drops_query_and_resets_page() {
        let (sb, nav) = search_box("/dashboard/invoices?query=lee&page=3");
        assert_eq!(sb.initial_value(), "lee");

        sb.on_input("");
        sleep(Duration::from_millis(301)).await;

        assert_eq!(nav.replaced(), vec!["/dashboard/invoices?page=1"]);
        assert_eq!(sb.initial_value(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn existing_params_keep_their_position() {
        let (sb, nav) = search_box("/dashboard/invoices?query=old&page=4");

        sb.on_input("paid");
        sleep(Duration::from_millis(301)).await;

        assert_eq!(nav.replaced(), vec!["/dashboard/invoices?query=paid&page=1"]);
        assert_eq!(sb.location().params.get("page"), Some("1"));
    }

    #[test]
    fn initial_value_is_empty_without_query() {
        let (sb, _nav) = search_box("/dashboard/customers?page=2");
        assert_eq!(sb.initial_value(), "");
    }
}
