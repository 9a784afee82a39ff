pub mod client;
pub mod types;

pub use client::{PredictionApi, ReplicateClient};
pub use types::{Prediction, PredictionStatus};
