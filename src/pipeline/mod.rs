pub mod explain;
pub mod fusion;
pub mod intel;
pub mod ml;
pub mod normalizer;
pub mod reputation;
pub mod rules;
pub mod url_features;
