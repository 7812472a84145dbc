pub mod chain_distance_limit;

pub use chain_distance_limit::ChainDistanceLimitFunctions;
