//! Evaluation of fallback chains: the first strategy that yields a non-empty
//! value wins.

use gridharvest_core::Lookup;

use crate::dom::ItemNode;
use crate::error::DomError;

/// Evaluates `chain` against the descendants of `node`.
///
/// # Errors
///
/// Returns [`DomError`] if querying the node fails. A strategy that simply
/// matches nothing is not an error.
pub async fn resolve<N: ItemNode>(node: &N, chain: &[Lookup]) -> Result<Option<String>, DomError> {
    resolve_where(node, chain, |_| true).await
}

/// Like [`resolve`], skipping candidate values rejected by `accept`.
///
/// # Errors
///
/// Returns [`DomError`] if querying the node fails.
pub async fn resolve_where<N, F>(
    node: &N,
    chain: &[Lookup],
    accept: F,
) -> Result<Option<String>, DomError>
where
    N: ItemNode,
    F: Fn(&str) -> bool,
{
    for lookup in chain {
        let Some(target) = node.find(lookup.selector()).await? else {
            continue;
        };

        match lookup {
            Lookup::Text { .. } => {
                let text = target.text().await?;
                let text = text.trim();
                if !text.is_empty() && accept(text) {
                    return Ok(Some(text.to_owned()));
                }
            }
            Lookup::Attr { names, .. } => {
                for name in names {
                    if let Some(value) = target.attr(name).await? {
                        let value = value.trim();
                        if !value.is_empty() && accept(value) {
                            return Ok(Some(value.to_owned()));
                        }
                    }
                }
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::static_html::StaticDocument;
    use crate::dom::Document;

    fn text(selector: &str) -> Lookup {
        Lookup::Text {
            selector: selector.to_owned(),
        }
    }

    fn attr(selector: &str, names: &[&str]) -> Lookup {
        Lookup::Attr {
            selector: selector.to_owned(),
            names: names.iter().map(|n| (*n).to_owned()).collect(),
        }
    }

    async fn tile(html: &str) -> <StaticDocument as Document>::Node {
        let doc = StaticDocument::parse(format!("<html><body>{html}</body></html>"));
        doc.find(".grid-item").await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn first_matching_strategy_wins() {
        let node = tile(
            r#"<div class="grid-item"><h3 class="product-name"><a><span>Linen Throw</span></a> Sale</h3></div>"#,
        )
        .await;
        let chain = [text(".product-name a span"), text(".product-name")];
        assert_eq!(
            resolve(&node, &chain).await.unwrap().as_deref(),
            Some("Linen Throw")
        );
    }

    #[tokio::test]
    async fn falls_back_when_primary_is_missing() {
        let node = tile(r#"<div class="grid-item"><h3 class="product-name">  Oak Stool </h3></div>"#).await;
        let chain = [text(".product-name a span"), text(".product-name")];
        assert_eq!(
            resolve(&node, &chain).await.unwrap().as_deref(),
            Some("Oak Stool")
        );
    }

    #[tokio::test]
    async fn blank_text_falls_through() {
        let node = tile(
            r#"<div class="grid-item"><span class="a">   </span><span class="b">Lamp</span></div>"#,
        )
        .await;
        assert_eq!(
            resolve(&node, &[text(".a"), text(".b")]).await.unwrap().as_deref(),
            Some("Lamp")
        );
    }

    #[tokio::test]
    async fn attribute_names_are_tried_in_order() {
        let node = tile(
            r#"<div class="grid-item"><img class="product-image" src="" data-src="/img/lazy-t.jpg"></div>"#,
        )
        .await;
        let chain = [attr("img.product-image", &["src", "data-src"])];
        assert_eq!(
            resolve(&node, &chain).await.unwrap().as_deref(),
            Some("/img/lazy-t.jpg")
        );
    }

    #[tokio::test]
    async fn rejected_values_fall_through() {
        let node = tile(
            r#"<div class="grid-item"><img class="product-image" src="data:image/gif;base64,R0" data-src="/img/real.jpg"></div>"#,
        )
        .await;
        let chain = [attr("img.product-image", &["src", "data-src"])];
        let value = resolve_where(&node, &chain, |v| !v.starts_with("data:"))
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("/img/real.jpg"));
    }

    #[tokio::test]
    async fn nothing_matching_is_none() {
        let node = tile(r#"<div class="grid-item"></div>"#).await;
        let chain = [text(".product-name"), attr("a", &["href"])];
        assert_eq!(resolve(&node, &chain).await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_selector_is_an_error() {
        let node = tile(r#"<div class="grid-item"></div>"#).await;
        let err = resolve(&node, &[text("a[")]).await.unwrap_err();
        assert!(matches!(err, DomError::InvalidSelector { .. }), "{err:?}");
    }
}
