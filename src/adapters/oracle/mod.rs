//! Classification oracle backends
//!
//! The [`ClassificationOracle`] trait is the only seam between the pipeline and
//! whatever decides a column's sensitivity. Two backends ship with the crate:
//!
//! - [`OpenAiOracle`] - remote OpenAI-compatible chat completions
//! - [`KeywordOracle`] - offline keyword and value-shape rules

pub mod factory;
pub mod keywords;
pub mod openai;
mod r#trait;

pub use factory::create_oracle;
pub use keywords::KeywordOracle;
pub use openai::OpenAiOracle;
pub use r#trait::ClassificationOracle;
