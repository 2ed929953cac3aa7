//! Scripted in-memory document for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

use gridharvest_core::{
    ImageRewrite, Lookup, PacingSettings, PaginationSettings, PauseRange, PriceLayout,
    ScrollStep, SelectorProfile, StoreProfile,
};

use crate::dom::{Document, ItemNode};
use crate::error::DomError;
use crate::pacing::Canceller;

#[derive(Debug, Clone)]
pub(crate) struct FakeNode {
    id: String,
    displayed: bool,
    stale: bool,
}

impl FakeNode {
    pub(crate) fn visible(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            displayed: true,
            stale: false,
        }
    }

    pub(crate) fn hidden(id: &str) -> Self {
        Self {
            displayed: false,
            ..Self::visible(id)
        }
    }

    pub(crate) fn stale(id: &str) -> Self {
        Self {
            stale: true,
            ..Self::visible(id)
        }
    }
}

impl ItemNode for FakeNode {
    async fn find_all(&self, _selector: &str) -> Result<Vec<Self>, DomError> {
        if self.stale {
            return Err(DomError::Stale);
        }
        Ok(Vec::new())
    }

    async fn text(&self) -> Result<String, DomError> {
        Ok(self.id.clone())
    }

    async fn attr(&self, _name: &str) -> Result<Option<String>, DomError> {
        Ok(None)
    }

    async fn is_displayed(&self) -> Result<bool, DomError> {
        if self.stale {
            return Err(DomError::Stale);
        }
        Ok(self.displayed)
    }

    async fn outer_html(&self) -> Result<String, DomError> {
        if self.stale {
            return Err(DomError::Stale);
        }
        Ok(format!("<div>{}</div>", self.id))
    }
}

/// Item counts and scroll heights are replayed from queues, one value per
/// probe; the last value repeats once a queue runs dry.
pub(crate) struct FakePage {
    item_selector: String,
    counts: RefCell<VecDeque<usize>>,
    current_count: Cell<usize>,
    heights: RefCell<VecDeque<u64>>,
    current_height: Cell<u64>,
    elements: HashMap<String, Vec<FakeNode>>,
    failing: HashSet<String>,
    clicked: RefCell<Vec<String>>,
    events: RefCell<Vec<String>>,
    scrolls: Cell<u32>,
    failing_scroll: bool,
    item_queries: Cell<u32>,
    cancel_after_scrolls: Option<(u32, Canceller)>,
}

impl FakePage {
    pub(crate) fn new(item_selector: &str) -> Self {
        Self {
            item_selector: item_selector.to_owned(),
            counts: RefCell::new(VecDeque::new()),
            current_count: Cell::new(0),
            heights: RefCell::new(VecDeque::new()),
            current_height: Cell::new(0),
            elements: HashMap::new(),
            failing: HashSet::new(),
            clicked: RefCell::new(Vec::new()),
            events: RefCell::new(Vec::new()),
            scrolls: Cell::new(0),
            failing_scroll: false,
            item_queries: Cell::new(0),
            cancel_after_scrolls: None,
        }
    }

    pub(crate) fn with_counts(self, counts: &[usize]) -> Self {
        *self.counts.borrow_mut() = counts.iter().copied().collect();
        self
    }

    pub(crate) fn with_heights(self, heights: &[u64]) -> Self {
        *self.heights.borrow_mut() = heights.iter().copied().collect();
        self
    }

    pub(crate) fn with_elements(mut self, selector: &str, nodes: Vec<FakeNode>) -> Self {
        self.elements.insert(selector.to_owned(), nodes);
        self
    }

    pub(crate) fn with_failing(mut self, selector: &str) -> Self {
        self.failing.insert(selector.to_owned());
        self
    }

    /// Every `scroll_by` is counted and then fails.
    pub(crate) fn with_failing_scroll(mut self) -> Self {
        self.failing_scroll = true;
        self
    }

    pub(crate) fn with_cancel_after_scrolls(mut self, scrolls: u32, canceller: Canceller) -> Self {
        self.cancel_after_scrolls = Some((scrolls, canceller));
        self
    }

    pub(crate) fn clicked(&self) -> Vec<String> {
        self.clicked.borrow().clone()
    }

    /// Clicks and scrolls in the order they happened, as `click:<id>` and
    /// `scroll`.
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub(crate) fn scrolls(&self) -> u32 {
        self.scrolls.get()
    }

    pub(crate) fn item_queries(&self) -> u32 {
        self.item_queries.get()
    }
}

impl Document for FakePage {
    type Node = FakeNode;

    async fn find_all(&self, selector: &str) -> Result<Vec<FakeNode>, DomError> {
        if self.failing.contains(selector) {
            return Err(DomError::Session(format!("scripted failure for {selector}")));
        }
        if selector == self.item_selector {
            self.item_queries.set(self.item_queries.get() + 1);
            if let Some(next) = self.counts.borrow_mut().pop_front() {
                self.current_count.set(next);
            }
            return Ok((0..self.current_count.get())
                .map(|i| FakeNode::visible(&format!("item-{i}")))
                .collect());
        }
        Ok(self.elements.get(selector).cloned().unwrap_or_default())
    }

    async fn click(&self, node: &FakeNode) -> Result<(), DomError> {
        self.clicked.borrow_mut().push(node.id.clone());
        self.events.borrow_mut().push(format!("click:{}", node.id));
        Ok(())
    }

    async fn scroll_by(&self, _step: ScrollStep) -> Result<(), DomError> {
        let scrolls = self.scrolls.get() + 1;
        self.scrolls.set(scrolls);
        self.events.borrow_mut().push("scroll".to_owned());
        if let Some((after, canceller)) = &self.cancel_after_scrolls {
            if scrolls >= *after {
                canceller.cancel();
            }
        }
        if self.failing_scroll {
            return Err(DomError::Session("scripted scroll failure".to_owned()));
        }
        Ok(())
    }

    async fn scroll_into_view(&self, _node: &FakeNode) -> Result<(), DomError> {
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, DomError> {
        if let Some(next) = self.heights.borrow_mut().pop_front() {
            self.current_height.set(next);
        }
        Ok(self.current_height.get())
    }

    async fn page_source(&self) -> Result<String, DomError> {
        Ok("<html></html>".to_owned())
    }
}

/// Pottery Barn style profile with zero pauses and short modal waits.
pub(crate) fn grid_profile() -> StoreProfile {
    let zero = PauseRange::fixed(0);
    StoreProfile {
        name: "Pottery Barn".to_owned(),
        seed_url: "https://www.potterybarn.com/shop/sale/open-box-deals/".to_owned(),
        origin: None,
        selectors: SelectorProfile {
            item: ".grid-item".to_owned(),
            load_more: Some("div.show-me-more > button".to_owned()),
            modal: None,
            name: vec![
                Lookup::Text {
                    selector: ".product-name a span".to_owned(),
                },
                Lookup::Text {
                    selector: ".product-name".to_owned(),
                },
            ],
            detail_url: vec![Lookup::Attr {
                selector: "a.product-image-link".to_owned(),
                names: vec!["href".to_owned()],
            }],
            image: vec![
                Lookup::Attr {
                    selector: "img.product-image".to_owned(),
                    names: vec!["src".to_owned(), "data-src".to_owned()],
                },
                Lookup::Attr {
                    selector: "img[data-test-id='alt-image']".to_owned(),
                    names: vec!["src".to_owned(), "data-src".to_owned()],
                },
            ],
            prices: PriceLayout::Amounts {
                container: ".product-pricing".to_owned(),
                amount: "span.amount".to_owned(),
                currency_prefix: "$".to_owned(),
            },
        },
        pagination: PaginationSettings {
            stall_threshold: Some(2),
            ..PaginationSettings::default()
        },
        pacing: PacingSettings {
            settle_pause_ms: zero,
            scroll_pause_ms: zero,
            modal_click_pause_ms: zero,
            reveal_pause_ms: zero,
            initial_settle_ms: 0,
            modal_timeout_ms: 5,
            modal_poll_ms: 1,
        },
        image_rewrites: vec![ImageRewrite {
            pattern: r"-t\.jpg$".to_owned(),
            replacement: "-c.jpg".to_owned(),
        }],
    }
}
