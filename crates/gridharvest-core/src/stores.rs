//! Store profiles: everything the engine needs to know about one storefront.
//!
//! Profiles are loaded from `config/stores.yaml`. Selectors are CSS; field
//! lookups are ordered chains of tagged strategies where the first strategy
//! that yields a non-empty value wins.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct StoresFile {
    pub stores: Vec<StoreProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreProfile {
    /// Display name, copied into every record's `Store` field.
    pub name: String,
    /// Category page the harvest starts from.
    pub seed_url: String,
    /// Origin used to absolutize relative links. Defaults to the seed URL's origin.
    #[serde(default)]
    pub origin: Option<String>,
    pub selectors: SelectorProfile,
    #[serde(default)]
    pub pagination: PaginationSettings,
    #[serde(default)]
    pub pacing: PacingSettings,
    /// Thumbnail → full-size rewrites applied to image URLs, in order.
    #[serde(default)]
    pub image_rewrites: Vec<ImageRewrite>,
}

impl StoreProfile {
    /// Generate a URL-safe slug from the store name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Returns the origin relative detail links are resolved against.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if neither `origin` nor `seed_url`
    /// parses as an absolute URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        let raw = self.origin.as_deref().unwrap_or(&self.seed_url);
        let parsed = url::Url::parse(raw).map_err(|e| {
            ConfigError::Validation(format!(
                "store '{}' has invalid origin '{raw}': {e}",
                self.name
            ))
        })?;
        let origin = parsed.origin();
        if !origin.is_tuple() {
            return Err(ConfigError::Validation(format!(
                "store '{}' origin '{raw}' has no host",
                self.name
            )));
        }
        url::Url::parse(&origin.ascii_serialization()).map_err(|e| {
            ConfigError::Validation(format!(
                "store '{}' has invalid origin '{raw}': {e}",
                self.name
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectorProfile {
    /// Matches every product tile.
    pub item: String,
    /// "Show more" button; pagination skips the click when absent.
    #[serde(default)]
    pub load_more: Option<String>,
    #[serde(default)]
    pub modal: Option<ModalSelectors>,
    pub name: Vec<Lookup>,
    pub detail_url: Vec<Lookup>,
    #[serde(default)]
    pub image: Vec<Lookup>,
    pub prices: PriceLayout,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModalSelectors {
    pub container: String,
    /// Close controls, highest priority first.
    pub close: Vec<String>,
}

/// One strategy in a field's fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum Lookup {
    /// Whitespace-trimmed text of the first element matching `selector`.
    Text { selector: String },
    /// First non-empty attribute among `names` on the first match.
    Attr { selector: String, names: Vec<String> },
}

impl Lookup {
    #[must_use]
    pub fn selector(&self) -> &str {
        match self {
            Lookup::Text { selector } | Lookup::Attr { selector, .. } => selector,
        }
    }
}

/// How the sale/original price pair is laid out inside a tile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum PriceLayout {
    /// Positional amounts inside one container: the first amount is the sale
    /// price and the last is the original price. A lone amount is the sale price.
    Amounts {
        container: String,
        amount: String,
        #[serde(default = "default_currency_prefix")]
        currency_prefix: String,
    },
    /// Each price has its own lookup chain.
    Labelled {
        #[serde(default)]
        sale: Vec<Lookup>,
        #[serde(default)]
        original: Vec<Lookup>,
    },
}

fn default_currency_prefix() -> String {
    "$".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageRewrite {
    /// Regular expression matched against the image URL.
    pub pattern: String,
    pub replacement: String,
}

impl ImageRewrite {
    /// Compiles the rewrite pattern.
    ///
    /// # Errors
    ///
    /// Returns the regex error when `pattern` is not a valid expression.
    pub fn compile(&self) -> Result<regex::Regex, regex::Error> {
        regex::Regex::new(&self.pattern)
    }
}

/// What the pagination loop watches for growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressSignal {
    #[default]
    ItemCount,
    ScrollHeight,
}

impl ProgressSignal {
    /// Stall threshold used when a store does not set one.
    #[must_use]
    pub fn default_stall_threshold(self) -> u32 {
        match self {
            ProgressSignal::ItemCount => 6,
            ProgressSignal::ScrollHeight => 3,
        }
    }
}

/// Size of one forward scroll.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrollStep {
    Pixels { amount: i64 },
    /// Fraction of the viewport height, e.g. `0.8`.
    ViewportFraction { fraction: f64 },
}

impl Default for ScrollStep {
    fn default() -> Self {
        ScrollStep::Pixels { amount: 1000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub max_scroll_iterations: u32,
    /// Unset means the default for `progress`.
    pub stall_threshold: Option<u32>,
    pub progress: ProgressSignal,
    pub scroll_step: ScrollStep,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            max_scroll_iterations: 200,
            stall_threshold: None,
            progress: ProgressSignal::ItemCount,
            scroll_step: ScrollStep::default(),
        }
    }
}

impl PaginationSettings {
    /// Consecutive no-growth probes tolerated before pagination stops.
    #[must_use]
    pub fn stall_threshold(&self) -> u32 {
        self.stall_threshold
            .unwrap_or_else(|| self.progress.default_stall_threshold())
    }
}

/// Inclusive millisecond bounds for a randomized pause, written `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "[u64; 2]")]
pub struct PauseRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl PauseRange {
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    #[must_use]
    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }
}

impl From<[u64; 2]> for PauseRange {
    fn from([min_ms, max_ms]: [u64; 2]) -> Self {
        Self { min_ms, max_ms }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    /// After clicking "load more".
    pub settle_pause_ms: PauseRange,
    /// After each forward scroll.
    pub scroll_pause_ms: PauseRange,
    /// After each modal close click.
    pub modal_click_pause_ms: PauseRange,
    /// After scrolling a tile into view, before reading it.
    pub reveal_pause_ms: PauseRange,
    /// Before the first pagination probe.
    pub initial_settle_ms: u64,
    pub modal_timeout_ms: u64,
    pub modal_poll_ms: u64,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            settle_pause_ms: PauseRange::new(2000, 3500),
            scroll_pause_ms: PauseRange::new(1200, 1800),
            modal_click_pause_ms: PauseRange::fixed(2000),
            reveal_pause_ms: PauseRange::fixed(100),
            initial_settle_ms: 0,
            modal_timeout_ms: 10_000,
            modal_poll_ms: 250,
        }
    }
}

/// Load and validate store profiles from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_stores(path: &Path) -> Result<StoresFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StoresFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let stores_file: StoresFile = serde_yaml::from_str(&content)?;

    validate_stores(&stores_file)?;

    Ok(stores_file)
}

impl StoresFile {
    /// Finds a store by slug (or case-insensitive display name).
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&StoreProfile> {
        self.stores
            .iter()
            .find(|s| s.slug() == key || s.name.eq_ignore_ascii_case(key))
    }
}

fn validate_stores(stores_file: &StoresFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for store in &stores_file.stores {
        if store.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store name must be non-empty".to_string(),
            ));
        }

        let slug = store.slug();
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "store '{}' produces an empty slug",
                store.name
            )));
        }
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate store slug: '{}' (from store '{}')",
                slug, store.name
            )));
        }

        validate_store(store)?;
    }

    Ok(())
}

fn validate_store(store: &StoreProfile) -> Result<(), ConfigError> {
    let fail = |reason: String| ConfigError::Validation(format!("store '{}' {reason}", store.name));

    let seed = url::Url::parse(&store.seed_url)
        .map_err(|e| fail(format!("has invalid seed_url '{}': {e}", store.seed_url)))?;
    if !matches!(seed.scheme(), "http" | "https") {
        return Err(fail(format!(
            "seed_url '{}' must use http or https",
            store.seed_url
        )));
    }
    store.origin_url()?;

    let selectors = &store.selectors;
    if selectors.item.trim().is_empty() {
        return Err(fail("has an empty item selector".to_string()));
    }
    if selectors.name.is_empty() {
        return Err(fail("needs at least one name lookup".to_string()));
    }
    if selectors.detail_url.is_empty() {
        return Err(fail("needs at least one detail_url lookup".to_string()));
    }
    if let Some(modal) = &selectors.modal {
        if modal.close.is_empty() {
            return Err(fail("declares a modal without close selectors".to_string()));
        }
    }
    let lookups = selectors
        .name
        .iter()
        .chain(&selectors.detail_url)
        .chain(&selectors.image);
    for lookup in lookups {
        if lookup.selector().trim().is_empty() {
            return Err(fail("has a lookup with an empty selector".to_string()));
        }
        if let Lookup::Attr { names, .. } = lookup {
            if names.is_empty() {
                return Err(fail(format!(
                    "attr lookup '{}' lists no attribute names",
                    lookup.selector()
                )));
            }
        }
    }

    let pagination = &store.pagination;
    if pagination.stall_threshold == Some(0) {
        return Err(fail("has stall_threshold 0; must be at least 1".to_string()));
    }
    if pagination.max_scroll_iterations == 0 {
        return Err(fail(
            "has max_scroll_iterations 0; must be at least 1".to_string(),
        ));
    }
    if let ScrollStep::ViewportFraction { fraction } = pagination.scroll_step {
        if fraction <= 0.0 || !fraction.is_finite() {
            return Err(fail(format!(
                "has viewport_fraction {fraction}; must be positive"
            )));
        }
    }

    let pacing = &store.pacing;
    for (label, range) in [
        ("settle_pause_ms", pacing.settle_pause_ms),
        ("scroll_pause_ms", pacing.scroll_pause_ms),
        ("modal_click_pause_ms", pacing.modal_click_pause_ms),
        ("reveal_pause_ms", pacing.reveal_pause_ms),
    ] {
        if range.min_ms > range.max_ms {
            return Err(fail(format!(
                "has {label} [{}, {}]; min must not exceed max",
                range.min_ms, range.max_ms
            )));
        }
    }

    for rewrite in &store.image_rewrites {
        rewrite.compile().map_err(|e| {
            fail(format!(
                "has invalid image rewrite pattern '{}': {e}",
                rewrite.pattern
            ))
        })?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "stores_test.rs"]
mod tests;
