pub mod evaluation;
pub mod matching;
pub mod metrics;
pub mod roc;
