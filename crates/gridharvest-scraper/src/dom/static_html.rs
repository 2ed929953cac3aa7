//! [`Document`] over a saved HTML page, parsed with `scraper`.
//!
//! A snapshot never changes, so clicks and scrolls are accepted and ignored.
//! Nodes carry their own outer HTML and re-parse it per query, which keeps
//! them owned and free of borrows into the document.

use gridharvest_core::ScrollStep;
use scraper::{ElementRef, Html, Selector};

use super::{Document, ItemNode};
use crate::error::DomError;

pub struct StaticDocument {
    html: Html,
    source: String,
}

impl StaticDocument {
    #[must_use]
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let html = Html::parse_document(&source);
        Self { html, source }
    }
}

#[derive(Debug, Clone)]
pub struct StaticNode {
    outer: String,
    /// Hidden by itself or by any ancestor at the time it was located.
    hidden: bool,
}

impl StaticNode {
    fn from_element(element: ElementRef<'_>, inherited_hidden: bool) -> Self {
        Self {
            outer: element.html(),
            hidden: inherited_hidden || hidden_in_context(element),
        }
    }

    fn with_element<T>(&self, f: impl FnOnce(ElementRef<'_>) -> T) -> Result<T, DomError> {
        let fragment = Html::parse_fragment(&self.outer);
        let element = fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap)
            .ok_or(DomError::Stale)?;
        Ok(f(element))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, DomError> {
    Selector::parse(selector).map_err(|e| DomError::InvalidSelector {
        selector: selector.to_owned(),
        reason: e.to_string(),
    })
}

fn hides(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("hidden").is_some() {
        return true;
    }
    value.attr("style").is_some_and(|style| {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        style.contains("display:none") || style.contains("visibility:hidden")
    })
}

fn hidden_in_context(element: ElementRef<'_>) -> bool {
    hides(&element)
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| hides(&ancestor))
}

impl Document for StaticDocument {
    type Node = StaticNode;

    async fn find_all(&self, selector: &str) -> Result<Vec<StaticNode>, DomError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .html
            .select(&selector)
            .map(|element| StaticNode::from_element(element, false))
            .collect())
    }

    async fn click(&self, _node: &StaticNode) -> Result<(), DomError> {
        Ok(())
    }

    async fn scroll_by(&self, _step: ScrollStep) -> Result<(), DomError> {
        Ok(())
    }

    async fn scroll_into_view(&self, _node: &StaticNode) -> Result<(), DomError> {
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, DomError> {
        Ok(u64::try_from(self.source.len()).unwrap_or(u64::MAX))
    }

    async fn page_source(&self) -> Result<String, DomError> {
        Ok(self.source.clone())
    }
}

impl ItemNode for StaticNode {
    async fn find_all(&self, selector: &str) -> Result<Vec<Self>, DomError> {
        let selector = parse_selector(selector)?;
        let inherited = self.hidden;
        self.with_element(|element| {
            element
                .select(&selector)
                .map(|child| StaticNode::from_element(child, inherited))
                .collect()
        })
    }

    async fn text(&self) -> Result<String, DomError> {
        self.with_element(|element| {
            let raw: String = element.text().collect();
            raw.split_whitespace().collect::<Vec<_>>().join(" ")
        })
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, DomError> {
        self.with_element(|element| element.value().attr(name).map(str::to_owned))
    }

    async fn is_displayed(&self) -> Result<bool, DomError> {
        Ok(!self.hidden)
    }

    async fn outer_html(&self) -> Result<String, DomError> {
        Ok(self.outer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="grid-item" data-sku="a1">
            <h3 class="product-name">
              <a href="/products/a1/"><span>  Aubrey
                 Sofa </span></a>
            </h3>
            <span class="amount">1,299</span><span class="amount">.00</span>
          </div>
          <div class="grid-item" style="display: none">
            <h3 class="product-name">Hidden Chair</h3>
          </div>
          <div class="show-me-more" hidden><button>Show More</button></div>
        </body></html>
    "#;

    #[tokio::test]
    async fn finds_all_items_in_document_order() {
        let doc = StaticDocument::parse(PAGE);
        let items = doc.find_all(".grid-item").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(doc.count(".grid-item").await.unwrap(), 2);
        assert_eq!(
            items[0].attr("data-sku").await.unwrap().as_deref(),
            Some("a1")
        );
    }

    #[tokio::test]
    async fn text_collapses_whitespace() {
        let doc = StaticDocument::parse(PAGE);
        let item = doc.find(".grid-item").await.unwrap().unwrap();
        let name = item.find(".product-name a span").await.unwrap().unwrap();
        assert_eq!(name.text().await.unwrap(), "Aubrey Sofa");
    }

    #[tokio::test]
    async fn node_queries_search_descendants_only() {
        let doc = StaticDocument::parse(PAGE);
        let item = doc.find(".grid-item").await.unwrap().unwrap();
        assert!(item.find(".grid-item").await.unwrap().is_none());
        let amounts = item.find_all("span.amount").await.unwrap();
        assert_eq!(amounts.len(), 2);
    }

    #[tokio::test]
    async fn visibility_follows_style_and_hidden_ancestors() {
        let doc = StaticDocument::parse(PAGE);
        let items = doc.find_all(".grid-item").await.unwrap();
        assert!(items[0].is_displayed().await.unwrap());
        assert!(!items[1].is_displayed().await.unwrap());

        let hidden_name = items[1].find(".product-name").await.unwrap().unwrap();
        assert!(!hidden_name.is_displayed().await.unwrap());

        let button = doc.find("div.show-me-more > button").await.unwrap().unwrap();
        assert!(!button.is_displayed().await.unwrap());
    }

    #[tokio::test]
    async fn invalid_selector_is_reported() {
        let doc = StaticDocument::parse(PAGE);
        let err = doc.find_all("div[").await.unwrap_err();
        assert!(
            matches!(err, DomError::InvalidSelector { ref selector, .. } if selector == "div["),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn outer_html_round_trips_the_element() {
        let doc = StaticDocument::parse(PAGE);
        let item = doc.find(".grid-item").await.unwrap().unwrap();
        let outer = item.outer_html().await.unwrap();
        assert!(outer.starts_with("<div class=\"grid-item\""), "{outer}");
        assert!(outer.contains("Aubrey"));
    }

    #[tokio::test]
    async fn page_source_is_the_original_text() {
        let doc = StaticDocument::parse(PAGE);
        assert_eq!(doc.page_source().await.unwrap(), PAGE);
    }
}
