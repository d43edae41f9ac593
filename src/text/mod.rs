//! Text preprocessing shared by every feature extractor.

pub mod normalizer;

pub use normalizer::TextNormalizer;
