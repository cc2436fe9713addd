use crate::eviction::{self, MAX_TABS};
use crate::view::{Tab, TabName, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, PartialEq)]
pub struct OpenedTab {
    pub name: TabName,
    pub created: bool,
    pub evicted: Option<Tab>,
}

#[derive(Debug, Clone)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
    active: Option<TabName>,
    next_index: u64,
    max_tabs: usize,
    default_page_size: u32,
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new(MAX_TABS, DEFAULT_PAGE_SIZE)
    }
}

impl TabRegistry {
    #[must_use]
    pub fn new(max_tabs: usize, default_page_size: u32) -> Self {
        Self {
            tabs: Vec::new(),
            active: None,
            next_index: 0,
            max_tabs: max_tabs.max(1),
            default_page_size: default_page_size.max(1),
        }
    }

    #[must_use]
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    #[must_use]
    pub fn max_tabs(&self) -> usize {
        self.max_tabs
    }

    #[must_use]
    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    #[must_use]
    pub fn active(&self) -> Option<&TabName> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.as_ref().and_then(|name| self.get(name))
    }

    #[must_use]
    pub fn get(&self, name: &TabName) -> Option<&Tab> {
        self.tabs.iter().find(|tab| &tab.name == name)
    }

    pub fn get_mut(&mut self, name: &TabName) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|tab| &tab.name == name)
    }

    #[must_use]
    pub fn find_table(&self, table_name: &str) -> Option<&Tab> {
        self.tabs
            .iter()
            .find(|tab| tab.table_name() == Some(table_name))
    }

    pub fn open_table(&mut self, table_name: &str) -> OpenedTab {
        if let Some(existing) = self.find_table(table_name) {
            let name = existing.name.clone();
            self.active = Some(name.clone());
            return OpenedTab {
                name,
                created: false,
                evicted: None,
            };
        }

        let name = self.issue_name();
        let tab = Tab::table(name.clone(), table_name, self.default_page_size);
        self.insert(tab)
    }

    pub fn open_query_tab(&mut self) -> OpenedTab {
        let sequence = self.next_index;
        let name = self.issue_name();
        self.insert(Tab::query(name, sequence))
    }

    pub fn set_active(&mut self, name: &TabName) -> bool {
        if self.get(name).is_none() {
            return false;
        }
        self.active = Some(name.clone());
        true
    }

    /// Removes a tab. Closing the active tab activates its predecessor, or the
    /// new first tab when the closed one was first.
    pub fn close(&mut self, name: &TabName) -> Option<Tab> {
        let index = self.tabs.iter().position(|tab| &tab.name == name)?;
        let removed = self.tabs.remove(index);

        if self.active.as_ref() == Some(name) {
            self.active = self
                .tabs
                .get(index.saturating_sub(1))
                .map(|tab| tab.name.clone());
        }
        Some(removed)
    }

    /// Drops every tab. The name counter keeps running.
    pub fn close_all(&mut self) -> usize {
        let closed = self.tabs.len();
        self.tabs.clear();
        self.active = None;
        closed
    }

    fn issue_name(&mut self) -> TabName {
        let name = TabName::from_index(self.next_index);
        self.next_index += 1;
        name
    }

    fn insert(&mut self, tab: Tab) -> OpenedTab {
        let evicted = eviction::make_room(&mut self.tabs, self.max_tabs);
        let name = tab.name.clone();
        self.tabs.push(tab);
        self.active = Some(name.clone());
        OpenedTab {
            name,
            created: true,
            evicted,
        }
    }
}
