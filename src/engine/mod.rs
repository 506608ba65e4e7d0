// * The Matching Engine
// * Pure, synchronous building blocks: key normalization, similarity scoring,
// * the alias index and the three-pass field resolver.

pub mod alias_index;
pub mod normalization;
pub mod resolver;
pub mod schema;
pub mod similarity;
pub mod units;

pub use alias_index::{AliasEntry, AliasIndex, AliasIndexCache, CommunityAlias, CommunityAliases};
pub use resolver::{resolve_fields, Candidate, MatchKind, Resolution, ResolvedField};
pub use schema::{Schema, SchemaError, SchemaField};
pub use similarity::similarity_score;
pub use units::UnitSystem;
