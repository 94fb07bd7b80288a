pub mod aggregator;
pub mod enumerator;
pub mod error;
pub mod evaluator;
pub mod types;

pub use aggregator::{AggregatorConfig, TierAggregator};
pub use enumerator::{Combinations, enumerate, singletons};
pub use error::{EngineError, EngineErrorKind};
pub use evaluator::{admits, admits_high, admits_low, admits_medium};
pub use types::{Combination, CombinationSet, Operator, OperatorIndex, Requirement, Tier};
