pub mod dom;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod lookup;
pub mod modal;
pub mod pacing;
pub mod pagination;
#[cfg(test)]
mod testing;
pub mod urls;

pub use dom::static_html::StaticDocument;
#[cfg(feature = "webdriver")]
pub use dom::webdriver::{SessionOptions, WebDriverDocument};
pub use dom::{Document, ItemNode};
pub use error::{DomError, ExtractionError, ExtractionFailure, Field, HarvestError};
pub use extract::ItemExtractor;
pub use harvest::Harvester;
pub use modal::{dismiss_modals, DismissOutcome};
pub use pacing::{Canceller, NoPacer, Pacer, RandomPacer, RunGuard};
pub use pagination::{reveal_all, PaginationOutcome, PaginationState, StallTracker};
