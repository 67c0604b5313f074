pub mod analysis;
pub mod pr;
pub mod repo;

pub use analysis::{
    Category, CategoryMap, ReleaseAnalysis, ReleaseDelta, ReleaseStats, SummaryBundle,
    SummaryLevel,
};
pub use pr::{CommitRef, PRInfo, ReleaseMetadata};
pub use repo::{ReleaseTagRequest, RepositoryRef, Shortcuts};
