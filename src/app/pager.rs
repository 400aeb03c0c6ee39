// src/app/pager.rs
use tracing::debug;

use crate::app::prefs::SessionPrefs;

/// The catalog refuses to page past this, whatever `total_pages` says.
pub const MAX_CATALOG_PAGE: u32 = 500;

/// Coerce a raw page value: anything non-positive becomes page 1.
pub fn sanitize_page(raw: i64) -> u32 {
    if raw <= 0 {
        1
    } else {
        u32::try_from(raw).unwrap_or(u32::MAX)
    }
}

/// Parse user-typed page input. NaN, junk and non-positive values become 1.
pub fn parse_page(raw: &str) -> u32 {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return sanitize_page(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 1.0 => sanitize_page(f.trunc() as i64),
        _ => 1,
    }
}

pub struct Pager {
    current: u32,
    total_pages: u32,
    prefs: SessionPrefs,
}

impl Pager {
    /// A remembered page from the session overrides the default of 1.
    pub fn new(prefs: SessionPrefs) -> Self {
        let current = prefs.remembered_page().unwrap_or(1);
        Self {
            current,
            total_pages: 0,
            prefs,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn effective_max(&self) -> u32 {
        self.total_pages.min(MAX_CATALOG_PAGE)
    }

    pub fn has_remembered_page(&self) -> bool {
        self.prefs.remembered_page().is_some()
    }

    pub fn prefs(&self) -> &SessionPrefs {
        &self.prefs
    }

    /// Record the server's page count. Returns true when the current page had
    /// to be pulled back into range.
    pub fn set_total_pages(&mut self, total_pages: u32) -> bool {
        self.total_pages = total_pages;
        let max = self.effective_max();
        if max >= 1 && self.current > max {
            debug!("page {} beyond last page {max}; clamping", self.current);
            self.current = max;
            self.prefs.remember_page(max);
            return true;
        }
        false
    }

    /// Jump to `n`. Ignored while a fetch is in flight or when out of range.
    pub fn go_to(&mut self, n: i64, busy: bool) -> bool {
        let page = sanitize_page(n);
        if busy || page > self.effective_max() || page == self.current {
            return false;
        }
        self.current = page;
        self.prefs.remember_page(page);
        true
    }

    pub fn first(&mut self, busy: bool) -> bool {
        self.go_to(1, busy)
    }

    pub fn previous(&mut self, busy: bool) -> bool {
        self.go_to(i64::from(self.current) - 1, busy)
    }

    pub fn next(&mut self, busy: bool) -> bool {
        self.go_to(i64::from(self.current) + 1, busy)
    }

    pub fn last(&mut self, busy: bool) -> bool {
        self.go_to(i64::from(self.effective_max()), busy)
    }

    /// Set the page without range checks; used when a new search resets it.
    pub(crate) fn reset_to_first(&mut self) {
        self.current = 1;
    }

    pub fn can_go_back(&self, busy: bool) -> bool {
        !busy && self.current > 1
    }

    pub fn can_go_forward(&self, busy: bool) -> bool {
        !busy && self.current < self.effective_max()
    }

    /// "Page X of Y" as shown under the results.
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.current, self.effective_max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pager_with_total(total: u32) -> Pager {
        let mut p = Pager::new(SessionPrefs::in_memory(None));
        p.set_total_pages(total);
        p
    }

    #[test]
    fn sanitizes_bad_input() {
        assert_eq!(sanitize_page(0), 1);
        assert_eq!(sanitize_page(-5), 1);
        assert_eq!(sanitize_page(7), 7);
        assert_eq!(parse_page("NaN"), 1);
        assert_eq!(parse_page("abc"), 1);
        assert_eq!(parse_page("-3"), 1);
        assert_eq!(parse_page(" 12 "), 12);
        assert_eq!(parse_page("4.9"), 4);
        assert_eq!(parse_page("inf"), 1);
    }

    #[test]
    fn go_to_stays_in_range() {
        let mut p = pager_with_total(20);
        for n in [-100_i64, -5, 0, 1, 3, 20, 21, 499, 500, 501, 10_000] {
            p.go_to(n, false);
            assert!((1..=20).contains(&p.current()), "n={n} -> {}", p.current());
        }
    }

    #[test]
    fn invalid_values_land_on_first_page() {
        let mut p = pager_with_total(10);
        assert!(p.go_to(6, false));
        assert!(p.go_to(0, false));
        assert_eq!(p.current(), 1);
        p.go_to(6, false);
        p.go_to(-5, false);
        assert_eq!(p.current(), 1);
        p.go_to(6, false);
        p.go_to(i64::from(parse_page("NaN")), false);
        assert_eq!(p.current(), 1);
    }

    #[test]
    fn busy_blocks_navigation() {
        let mut p = pager_with_total(10);
        assert!(!p.go_to(5, true));
        assert!(!p.next(true));
        assert!(!p.last(true));
        assert_eq!(p.current(), 1);
        assert!(!p.can_go_forward(true));
        assert!(p.can_go_forward(false));
        assert!(!p.can_go_back(false));
    }

    #[test]
    fn caps_at_catalog_ceiling() {
        let mut p = pager_with_total(1200);
        assert_eq!(p.effective_max(), 500);
        assert!(p.last(false));
        assert_eq!(p.current(), 500);
        assert!(!p.next(false));
        assert_eq!(p.current(), 500);
        assert!(p.previous(false));
        assert_eq!(p.current(), 499);
        assert_eq!(p.label(), "Page 499 of 500");
    }

    #[test]
    fn nothing_reachable_before_first_response() {
        let mut p = Pager::new(SessionPrefs::in_memory(None));
        assert_eq!(p.effective_max(), 0);
        assert!(!p.go_to(2, false));
        assert!(!p.previous(false));
        assert_eq!(p.current(), 1);
    }

    #[test]
    fn remembered_page_wins_and_accepted_moves_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session_prefs.txt");

        let mut first = Pager::new(SessionPrefs::load(&path));
        assert_eq!(first.current(), 1);
        first.set_total_pages(30);
        assert!(first.go_to(12, false));
        assert!(!first.go_to(31, false));

        let second = Pager::new(SessionPrefs::load(&path));
        assert_eq!(second.current(), 12);
        assert!(second.has_remembered_page());
    }

    #[test]
    fn shrinking_total_clamps_current() {
        let mut p = Pager::new(SessionPrefs::in_memory(Some(40)));
        assert_eq!(p.current(), 40);
        assert!(p.set_total_pages(3));
        assert_eq!(p.current(), 3);
        assert_eq!(p.prefs().remembered_page(), Some(3));
        // empty result sets leave the page alone
        assert!(!p.set_total_pages(0));
        assert_eq!(p.current(), 3);
    }
}
