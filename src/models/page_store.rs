use super::Combination;
use std::collections::HashSet;

/// Fixed bucket capacity.
pub const PAGE_SIZE: usize = 50;

/// One surviving combination plus its transient "marked for deletion" flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageEntry {
    combination: Combination,
    pub marked: bool,
}

impl PageEntry {
    pub fn new(combination: Combination) -> Self {
        Self {
            combination,
            marked: false,
        }
    }

    pub fn combination(&self) -> &Combination {
        &self.combination
    }

    /// Text form, identical to the soft-delete signature.
    pub fn text(&self) -> String {
        self.combination.signature()
    }
}

/// Read-only copy of a visible entry, as published to the view state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibleEntry {
    pub text: String,
    pub marked: bool,
}

/// Immutable snapshot of the current page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageView {
    pub page_index: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    pub entries: Vec<VisibleEntry>,
    pub soft_deleted: usize,
}

impl PageView {
    pub fn has_prev(&self) -> bool {
        self.page_index > 0
    }

    pub fn has_next(&self) -> bool {
        self.page_index + 1 < self.total_pages
    }
}

/// Result of [`PageStore::delete_marked`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    /// Signatures removed by this batch
    pub removed: Vec<String>,
    pub view: PageView,
}

/// Accumulates matches into fixed-capacity buckets while a scan is running.
///
/// Owned by the scan worker; handed over whole to [`PageStore::install`].
#[derive(Debug, Default)]
pub struct PageBuilder {
    buckets: Vec<Vec<PageEntry>>,
    matched: usize,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, combination: Combination) {
        match self.buckets.last_mut() {
            Some(bucket) if bucket.len() < PAGE_SIZE => bucket.push(PageEntry::new(combination)),
            _ => {
                let mut bucket = Vec::with_capacity(PAGE_SIZE);
                bucket.push(PageEntry::new(combination));
                self.buckets.push(bucket);
            }
        }
        self.matched += 1;
    }

    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn into_buckets(self) -> Vec<Vec<PageEntry>> {
        self.buckets
    }
}

/// Page-bucketed scan results with a soft-delete overlay.
///
/// Only the interactive context touches a `PageStore`: scans build their buckets
/// separately ([`PageBuilder`]) and install them on completion. Deleting entries
/// rebuilds every bucket after the removal point, which is linear in the number
/// of matches but only happens on explicit user action.
#[derive(Debug, Default)]
pub struct PageStore {
    buckets: Vec<Vec<PageEntry>>,
    total_matches: usize,
    current: usize,
    removed: HashSet<String>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear results, cursor and the soft-delete set.
    pub fn reset(&mut self) {
        self.buckets.clear();
        self.total_matches = 0;
        self.current = 0;
        self.removed.clear();
    }

    /// Replace the results with freshly scanned buckets and show `requested_page`
    /// (clamped to the new page count).
    pub fn install(&mut self, buckets: Vec<Vec<PageEntry>>, requested_page: usize) -> PageView {
        self.total_matches = buckets.iter().map(Vec::len).sum();
        self.buckets = buckets;
        self.current = 0;
        self.show_page(requested_page)
    }

    pub fn page_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn total_matches(&self) -> usize {
        self.total_matches
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Entries of the current page.
    pub fn visible(&self) -> &[PageEntry] {
        self.buckets
            .get(self.current)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every stored entry in scan order.
    pub fn entries(&self) -> impl Iterator<Item = &PageEntry> {
        self.buckets.iter().flatten()
    }

    pub fn removed_signatures(&self) -> &HashSet<String> {
        &self.removed
    }

    pub fn view(&self) -> PageView {
        PageView {
            page_index: self.current,
            total_pages: self.page_count(),
            total_matches: self.total_matches,
            entries: self
                .visible()
                .iter()
                .map(|entry| VisibleEntry {
                    text: entry.text(),
                    marked: entry.marked,
                })
                .collect(),
            soft_deleted: self.removed.len(),
        }
    }

    /// Show page `index`, clamped to the last page. An empty store yields an
    /// empty view at page 0.
    pub fn show_page(&mut self, index: usize) -> PageView {
        self.current = match self.buckets.len() {
            0 => 0,
            count => index.min(count - 1),
        };
        tracing::debug!("Showing page {} of {}", self.current + 1, self.page_count());
        self.view()
    }

    pub fn next_page(&mut self) -> PageView {
        self.show_page(self.current.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> PageView {
        self.show_page(self.current.saturating_sub(1))
    }

    /// Jump to a 1-based page number typed by the user. Unparsable or
    /// non-positive input goes to page 1.
    pub fn go_to_page(&mut self, input: &str) -> PageView {
        let page = input
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|&page| page > 0)
            .unwrap_or(1);
        let index = usize::try_from(page - 1).unwrap_or(usize::MAX);
        self.show_page(index)
    }

    /// Flag or unflag the visible entry at `position`. Returns `false` when there
    /// is no such entry.
    pub fn set_marked(&mut self, position: usize, marked: bool) -> bool {
        match self
            .buckets
            .get_mut(self.current)
            .and_then(|bucket| bucket.get_mut(position))
        {
            Some(entry) => {
                entry.marked = marked;
                true
            }
            None => false,
        }
    }

    pub fn toggle_marked(&mut self, position: usize) -> bool {
        match self.visible().get(position) {
            Some(entry) => {
                let flag = !entry.marked;
                self.set_marked(position, flag)
            }
            None => false,
        }
    }

    /// Remove every marked visible entry, add it to the soft-delete set and
    /// re-bucket the remaining entries at [`PAGE_SIZE`].
    pub fn delete_marked(&mut self) -> DeleteSummary {
        let doomed: HashSet<Combination> = self
            .visible()
            .iter()
            .filter(|entry| entry.marked)
            .map(|entry| *entry.combination())
            .collect();

        if doomed.is_empty() {
            return DeleteSummary {
                removed: Vec::new(),
                view: self.view(),
            };
        }

        let mut removed: Vec<String> = doomed.iter().map(Combination::signature).collect();
        removed.sort();
        self.removed.extend(removed.iter().cloned());

        let remaining: Vec<PageEntry> = std::mem::take(&mut self.buckets)
            .into_iter()
            .flatten()
            .filter(|entry| !doomed.contains(entry.combination()))
            .collect();

        self.total_matches = remaining.len();
        self.buckets = remaining
            .chunks(PAGE_SIZE)
            .map(<[PageEntry]>::to_vec)
            .collect();

        tracing::info!(
            "Soft-deleted {} entries, {} matches remain",
            removed.len(),
            self.total_matches
        );

        let view = self.show_page(self.current);
        DeleteSummary { removed, view }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::enumerator::combinations;

    fn store_with(count: usize) -> PageStore {
        let mut builder = PageBuilder::new();
        for combo in combinations().take(count) {
            builder.push(combo);
        }
        let mut store = PageStore::new();
        store.install(builder.into_buckets(), 0);
        store
    }

    #[test]
    fn test_builder_buckets_at_capacity() {
        let mut builder = PageBuilder::new();
        for combo in combinations().take(120) {
            builder.push(combo);
        }
        assert_eq!(builder.matched(), 120);
        let buckets = builder.into_buckets();
        let sizes: Vec<_> = buckets.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![50, 50, 20]);
    }

    #[test]
    fn test_empty_store() {
        let mut store = PageStore::new();
        let view = store.show_page(5);
        assert_eq!(view.page_index, 0);
        assert_eq!(view.total_pages, 0);
        assert!(view.entries.is_empty());
        assert!(!view.has_next());
        assert!(store.go_to_page("3").entries.is_empty());
    }

    #[test]
    fn test_show_page_clamps() {
        let mut store = store_with(120);
        assert_eq!(store.show_page(99).page_index, 2);
        assert_eq!(store.visible().len(), 20);
        assert_eq!(store.prev_page().page_index, 1);
        assert_eq!(store.next_page().page_index, 2);
        assert_eq!(store.next_page().page_index, 2);
    }

    #[test]
    fn test_go_to_page_parsing() {
        let mut store = store_with(120);
        assert_eq!(store.go_to_page("2").page_index, 1);
        assert_eq!(store.go_to_page(" 3 ").page_index, 2);
        assert_eq!(store.go_to_page("0").page_index, 0);
        assert_eq!(store.go_to_page("-4").page_index, 0);
        assert_eq!(store.go_to_page("two").page_index, 0);
        assert_eq!(store.go_to_page("999999999999").page_index, 2);
    }

    #[test]
    fn test_install_clamps_requested_page() {
        let mut builder = PageBuilder::new();
        for combo in combinations().take(60) {
            builder.push(combo);
        }
        let mut store = PageStore::new();
        let view = store.install(builder.into_buckets(), 7);
        assert_eq!(view.page_index, 1);
        assert_eq!(view.total_matches, 60);
        assert_eq!(view.entries.len(), 10);
    }

    #[test]
    fn test_toggle_marked() {
        let mut store = store_with(10);
        assert!(store.toggle_marked(3));
        assert!(store.visible()[3].marked);
        assert!(store.toggle_marked(3));
        assert!(!store.visible()[3].marked);
        assert!(!store.toggle_marked(10));
    }

    #[test]
    fn test_delete_marked_rebuckets() {
        let mut store = store_with(120);
        store.show_page(0);
        let first = store.visible()[0].text();
        let second = store.visible()[1].text();
        store.set_marked(0, true);
        store.set_marked(1, true);

        let summary = store.delete_marked();

        assert_eq!(summary.removed.len(), 2);
        assert_eq!(summary.view.total_matches, 118);
        assert_eq!(summary.view.total_pages, 3);
        assert_eq!(store.visible().len(), 50);
        assert!(store.removed_signatures().contains(&first));
        assert!(store.removed_signatures().contains(&second));
        assert!(store.entries().all(|e| e.text() != first && e.text() != second));

        // bucket boundaries shifted: last page now holds 18
        assert_eq!(store.show_page(2).entries.len(), 18);
    }

    #[test]
    fn test_delete_clamps_current_page() {
        let mut store = store_with(51);
        store.show_page(1);
        store.set_marked(0, true);

        let summary = store.delete_marked();

        assert_eq!(summary.view.total_matches, 50);
        assert_eq!(summary.view.total_pages, 1);
        assert_eq!(summary.view.page_index, 0);
    }

    #[test]
    fn test_delete_without_marks_is_noop() {
        let mut store = store_with(60);
        let summary = store.delete_marked();
        assert!(summary.removed.is_empty());
        assert_eq!(summary.view.total_matches, 60);
        assert!(store.removed_signatures().is_empty());
    }

    #[test]
    fn test_reset_clears_soft_deletes() {
        let mut store = store_with(60);
        store.set_marked(0, true);
        store.delete_marked();
        assert_eq!(store.removed_signatures().len(), 1);

        store.reset();
        assert!(store.is_empty());
        assert!(store.removed_signatures().is_empty());
        assert_eq!(store.total_matches(), 0);
    }
}
