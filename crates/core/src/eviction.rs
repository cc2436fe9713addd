use crate::view::Tab;

pub const MAX_TABS: usize = 10;

/// Index of the tab to drop: the oldest table tab, else the oldest tab.
#[must_use]
pub fn select_victim(tabs: &[Tab]) -> Option<usize> {
    if tabs.is_empty() {
        return None;
    }
    Some(tabs.iter().position(Tab::is_table).unwrap_or(0))
}

/// Makes room for one more tab. Removes at most one tab per call.
pub fn make_room(tabs: &mut Vec<Tab>, max_tabs: usize) -> Option<Tab> {
    if tabs.len() < max_tabs {
        return None;
    }
    select_victim(tabs).map(|index| tabs.remove(index))
}
