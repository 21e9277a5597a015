//! In-process name matching primitives shared by the tiers.

pub mod ngram;
pub mod phonetic;

pub use ngram::{NameVectorizer, VectorizerConfig, VectorizerError, cosine};
pub use phonetic::{PhoneticCode, phonetic_eq, soundex};
