/// Page shown when the fragment is empty.
pub const DEFAULT_HOME: &str = "Home";

/// Page ids of the companion wiki (file names without `.md`).
pub const DEFAULT_PAGES: &[&str] = &[
    "_Footer",
    "AAA",
    "bug-report-template",
    "ci-build",
    "Gemini",
    "git-workflow",
    "Home",
    "project-list",
    "project-template",
    "README",
    "testing-basics",
];

/// Menu text for a page id: hyphens read as spaces.
pub fn menu_label(page: &str) -> String {
    page.replace('-', " ")
}

/// What to do for a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Fetch and show this page.
    Fetch(String),
    /// Page is not in the configured list and validation is on.
    Unlisted(String),
}

/// Tracks the configured page list and which menu entry is active.
///
/// The active entry only moves once a page has actually loaded; failed
/// loads leave it where it was.
#[derive(Debug, Clone)]
pub struct WikiNavigator {
    pages: Vec<String>,
    home: String,
    validate: bool,
    active: Option<String>,
}

impl WikiNavigator {
    pub fn new(pages: Vec<String>, home: impl Into<String>, validate: bool) -> Self {
        Self {
            pages,
            home: home.into(),
            validate,
            active: None,
        }
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn is_listed(&self, page: &str) -> bool {
        self.pages.iter().any(|p| p == page)
    }

    /// Page id for a URL-style fragment. One leading `#` is optional;
    /// empty means home.
    pub fn page_for_fragment(&self, fragment: &str) -> String {
        let fragment = fragment.trim();
        let page = fragment.strip_prefix('#').unwrap_or(fragment);
        if page.is_empty() {
            self.home.clone()
        } else {
            page.to_string()
        }
    }

    pub fn resolve(&self, fragment: &str) -> Navigation {
        let page = self.page_for_fragment(fragment);
        if self.validate && !self.is_listed(&page) {
            Navigation::Unlisted(page)
        } else {
            Navigation::Fetch(page)
        }
    }

    /// Record a successful load. The marker moves off the previous entry;
    /// an unlisted page has no entry, so nothing ends up marked.
    pub fn activate(&mut self, page: &str) {
        self.active = self.is_listed(page).then(|| page.to_string());
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_index(&self) -> Option<usize> {
        let active = self.active.as_deref()?;
        self.pages.iter().position(|p| p == active)
    }
}

impl Default for WikiNavigator {
    fn default() -> Self {
        Self::new(
            DEFAULT_PAGES.iter().map(|p| p.to_string()).collect(),
            DEFAULT_HOME,
            true,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fragment_means_home() {
        let nav = WikiNavigator::default();
        assert_eq!(nav.page_for_fragment(""), "Home");
        assert_eq!(nav.page_for_fragment("#"), "Home");
        assert_eq!(nav.resolve(""), Navigation::Fetch("Home".into()));
    }

    #[test]
    fn fragment_hash_is_stripped() {
        let nav = WikiNavigator::default();
        assert_eq!(nav.page_for_fragment("#ci-build"), "ci-build");
        assert_eq!(nav.page_for_fragment("ci-build"), "ci-build");
    }

    #[test]
    fn only_one_hash_is_stripped() {
        let nav = WikiNavigator::default();
        assert_eq!(nav.page_for_fragment("##ci-build"), "#ci-build");
        assert_eq!(nav.resolve("##Home"), Navigation::Unlisted("#Home".into()));
    }

    #[test]
    fn unlisted_page_rejected_when_validating() {
        let nav = WikiNavigator::default();
        assert_eq!(nav.resolve("#nope"), Navigation::Unlisted("nope".into()));
    }

    #[test]
    fn unlisted_page_fetched_without_validation() {
        let nav = WikiNavigator::new(vec!["Home".into()], "Home", false);
        assert_eq!(nav.resolve("nope"), Navigation::Fetch("nope".into()));
    }

    #[test]
    fn activate_moves_marker() {
        let mut nav = WikiNavigator::default();
        assert!(nav.active().is_none());

        nav.activate("Home");
        assert_eq!(nav.active(), Some("Home"));
        assert_eq!(nav.active_index(), Some(6));

        nav.activate("AAA");
        assert_eq!(nav.active(), Some("AAA"));
        assert_eq!(nav.active_index(), Some(1));
    }

    #[test]
    fn activating_unlisted_page_clears_marker() {
        let mut nav = WikiNavigator::new(vec!["Home".into()], "Home", false);
        nav.activate("Home");
        nav.activate("elsewhere");
        assert!(nav.active().is_none());
        assert!(nav.active_index().is_none());
    }

    #[test]
    fn menu_label_replaces_hyphens() {
        assert_eq!(menu_label("bug-report-template"), "bug report template");
        assert_eq!(menu_label("_Footer"), "_Footer");
    }

    #[test]
    fn default_list_contains_home() {
        let nav = WikiNavigator::default();
        assert_eq!(nav.pages().len(), 11);
        assert!(nav.is_listed(nav.home()));
    }
}
