//! Service layer for the link audit engine.
//!
//! One service per engine component:
//! - Tabular export parsing (`TabularReader`)
//! - Redirect resolution (`RedirectResolver`)
//! - Paginated listing harvest (`PaginatedHarvester`)
//! - Candidate link selection (`LinkExtractor`)
//! - Oracle report repair (`OracleNormalizer`)
//! - Finding correlation (`Correlator`, `GuideNames`)

mod correlator;
mod extractor;
mod guides;
mod harvester;
mod normalizer;
mod reader;
mod resolver;

pub use correlator::{Correlation, CorrelationIndex, Correlator};
pub use extractor::{CandidateSet, LinkExtractor};
pub use guides::{GuideNames, normalize_guide_ref};
pub use harvester::{
    HarvestOutcome, ListingPage, PageRequest, PaginatedHarvester, Resumption, parse_listing,
};
pub use normalizer::{NormalizedTable, OracleNormalizer};
pub use reader::{ParsedTable, TabularReader};
pub use resolver::RedirectResolver;
