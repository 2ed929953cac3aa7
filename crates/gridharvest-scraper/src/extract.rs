//! Per-tile extraction.
//!
//! `name` and `detail_url` are required and fail the tile when they cannot be
//! resolved. Image and prices are optional: lookup problems there are logged
//! and the field is left empty.

use gridharvest_core::{ConfigError, Lookup, PriceLayout, ProductRecord, StoreProfile};
use tracing::{debug, warn};
use url::Url;

use crate::dom::{Document, ItemNode};
use crate::error::{DomError, ExtractionError, ExtractionFailure, Field, HarvestError};
use crate::lookup::{resolve, resolve_where};
use crate::pacing::{Pacer, RunGuard};
use crate::urls::{absolutize, resolve_detail_url, ImageRewriter};

/// Turns item nodes into [`ProductRecord`]s for one store.
pub struct ItemExtractor<'a, P> {
    profile: &'a StoreProfile,
    origin: Url,
    rewriter: ImageRewriter,
    pacer: &'a P,
    guard: &'a RunGuard,
}

impl<'a, P: Pacer> ItemExtractor<'a, P> {
    /// # Errors
    ///
    /// Returns [`HarvestError::Profile`] if the store origin is unusable or an
    /// image rewrite pattern does not compile.
    pub fn new(
        profile: &'a StoreProfile,
        pacer: &'a P,
        guard: &'a RunGuard,
    ) -> Result<Self, HarvestError> {
        let origin = profile.origin_url()?;
        let rules = profile
            .image_rewrites
            .iter()
            .map(|rule| {
                rule.compile()
                    .map(|re| (re, rule.replacement.clone()))
                    .map_err(|e| {
                        ConfigError::Validation(format!(
                            "store '{}' has invalid image rewrite '{}': {e}",
                            profile.name, rule.pattern
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            profile,
            origin,
            rewriter: ImageRewriter::new(rules),
            pacer,
            guard,
        })
    }

    /// Extracts one tile. `index` is the tile's position in the item snapshot.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionFailure`] carrying the reason and, when the node
    /// can still be serialized, its outer HTML.
    pub async fn extract<D: Document>(
        &self,
        doc: &D,
        node: &D::Node,
        index: usize,
    ) -> Result<ProductRecord, ExtractionFailure> {
        match self.extract_fields(doc, node).await {
            Ok(record) => Ok(record),
            Err(error) => {
                let snapshot = match node.outer_html().await {
                    Ok(html) => Some(html),
                    Err(e) => {
                        debug!(index, error = %e, "tile snapshot unavailable");
                        None
                    }
                };
                Err(ExtractionFailure {
                    index,
                    error,
                    snapshot,
                })
            }
        }
    }

    async fn extract_fields<D: Document>(
        &self,
        doc: &D,
        node: &D::Node,
    ) -> Result<ProductRecord, ExtractionError> {
        let selectors = &self.profile.selectors;

        // Lazy-loaded images only resolve their src once on screen.
        if let Err(e) = doc.scroll_into_view(node).await {
            debug!(error = %e, "scroll into view failed");
        }
        self.guard
            .sleep(self.pacer.delay(self.profile.pacing.reveal_pause_ms))
            .await;

        let name = resolve(node, &selectors.name)
            .await?
            .ok_or(ExtractionError::MissingField(Field::Name))?;
        let href = resolve(node, &selectors.detail_url)
            .await?
            .ok_or(ExtractionError::MissingField(Field::DetailUrl))?;
        let detail_url = resolve_detail_url(&self.origin, &href)?;

        let image_url = self.image_url(node).await;
        let (sale_price, original_price) = self.prices(node).await;

        Ok(ProductRecord {
            name,
            original_price,
            sale_price,
            image_url,
            detail_url,
            store: self.profile.name.clone(),
        })
    }

    async fn image_url<N: ItemNode>(&self, node: &N) -> Option<String> {
        let chain = &self.profile.selectors.image;
        if chain.is_empty() {
            return None;
        }

        match resolve_where(node, chain, |v| !v.starts_with("data:")).await {
            Ok(Some(raw)) => {
                let Some(url) = absolutize(&self.origin, &raw) else {
                    debug!(raw = %raw, "unusable image URL");
                    return None;
                };
                Some(self.rewriter.apply(&url))
            }
            Ok(None) => {
                debug!("no image found for tile");
                None
            }
            Err(e) => {
                warn!(error = %e, "image lookup failed");
                None
            }
        }
    }

    async fn prices<N: ItemNode>(&self, node: &N) -> (Option<String>, Option<String>) {
        let result = match &self.profile.selectors.prices {
            PriceLayout::Amounts {
                container,
                amount,
                currency_prefix,
            } => amount_prices(node, container, amount, currency_prefix).await,
            PriceLayout::Labelled { sale, original } => {
                labelled_prices(node, sale, original).await
            }
        };

        result.unwrap_or_else(|e| {
            warn!(error = %e, "price lookup failed");
            (None, None)
        })
    }
}

async fn amount_prices<N: ItemNode>(
    node: &N,
    container: &str,
    amount: &str,
    currency_prefix: &str,
) -> Result<(Option<String>, Option<String>), DomError> {
    let Some(block) = node.find(container).await? else {
        return Ok((None, None));
    };

    let mut amounts = Vec::new();
    for span in block.find_all(amount).await? {
        let text = span.text().await?;
        let text = text.trim();
        if !text.is_empty() {
            amounts.push(with_prefix(text, currency_prefix));
        }
    }
    Ok(split_amounts(amounts))
}

async fn labelled_prices<N: ItemNode>(
    node: &N,
    sale: &[Lookup],
    original: &[Lookup],
) -> Result<(Option<String>, Option<String>), DomError> {
    let sale = resolve(node, sale).await?;
    let original = resolve(node, original).await?;
    Ok((sale, original))
}

/// Maps positional amounts to `(sale, original)`.
///
/// One amount is the sale price. With two or more, the first is the sale
/// price and the last the original; amounts in between are dropped.
pub(crate) fn split_amounts(amounts: Vec<String>) -> (Option<String>, Option<String>) {
    if amounts.len() > 2 {
        warn!(
            count = amounts.len(),
            "more than two price amounts, using first as sale and last as original"
        );
    }
    let mut amounts = amounts.into_iter();
    let sale = amounts.next();
    let original = amounts.next_back();
    (sale, original)
}

fn with_prefix(text: &str, prefix: &str) -> String {
    if text.starts_with(prefix) {
        text.to_owned()
    } else {
        format!("{prefix}{text}")
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
