pub mod agent;
pub mod error;
pub mod network;
pub mod policy;
pub mod td_learning;

pub use agent::{Agent, Evaluation, MoveStrategy};
pub use error::{NetworkError, PolicyError, TrainingError};
pub use network::ValueNetwork;
pub use policy::{Choice, Policy, ValueEstimator};
pub use td_learning::{EpisodeSummary, Model, Outcomes};
