use indexmap::IndexSet;
use leaddesk_protocol::LeadId;

/// Header checkbox state for the current page. Derived, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageCheckState {
    Unchecked,
    Indeterminate,
    Checked,
}

/// Marked lead ids, independent of which page is displayed.
///
/// Ids stay selected across page changes until they are explicitly
/// deselected or the whole set is cleared. Insertion order is kept so bulk
/// payloads list ids in the order the operator picked them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: IndexSet<LeadId>,
}

impl SelectionSet {
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.shift_remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Selects every id of the given page; other pages are untouched.
    pub fn select_all<I, S>(&mut self, page_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in page_ids {
            if !self.ids.contains(id.as_ref()) {
                self.ids.insert(id.as_ref().to_string());
            }
        }
    }

    pub fn deselect_all<I, S>(&mut self, page_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in page_ids {
            self.ids.shift_remove(id.as_ref());
        }
    }

    /// Header checkbox click: clears the page when it is fully selected,
    /// selects the whole page otherwise.
    pub fn toggle_page<S: AsRef<str>>(&mut self, page_ids: &[S]) {
        if self.is_all_selected_on_page(page_ids) {
            self.deselect_all(page_ids);
        } else {
            self.select_all(page_ids);
        }
    }

    /// Swaps the selection for a freshly expanded matching set.
    pub fn replace_with(&mut self, ids: impl IntoIterator<Item = LeadId>) {
        self.ids = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// False for an empty page.
    pub fn is_all_selected_on_page<S: AsRef<str>>(&self, page_ids: &[S]) -> bool {
        !page_ids.is_empty() && page_ids.iter().all(|id| self.is_selected(id.as_ref()))
    }

    pub fn is_any_selected(&self) -> bool {
        !self.ids.is_empty()
    }

    pub fn page_check_state<S: AsRef<str>>(&self, page_ids: &[S]) -> PageCheckState {
        let some = page_ids.iter().any(|id| self.is_selected(id.as_ref()));
        if self.is_all_selected_on_page(page_ids) {
            PageCheckState::Checked
        } else if some {
            PageCheckState::Indeterminate
        } else {
            PageCheckState::Unchecked
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<LeadId> {
        self.ids.iter().cloned().collect()
    }
}
