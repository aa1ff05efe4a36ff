//! Driving policies and the generational optimizer that breeds them.

pub mod network;
pub mod population;

pub use network::{DenseLayer, FeedForwardPolicy, PolicyGenome};
pub use population::{Member, Population, PopulationConfig};
