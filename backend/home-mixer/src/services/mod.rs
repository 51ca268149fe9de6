pub mod diversity;
pub mod explanation;
pub mod filters;
pub mod hydration;
pub mod pipeline;
pub mod scoring;
pub mod selection;
pub mod sources;

pub use diversity::AuthorDiversityScorer;
pub use filters::FilterChain;
pub use hydration::Hydrator;
pub use pipeline::HomeMixer;
pub use scoring::WeightedScorer;
pub use selection::Selector;
pub use sources::SourceLayer;
