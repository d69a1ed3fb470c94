pub mod analysis;
pub mod correlation;
pub mod data_handling;
pub mod helper_functions;
pub mod merge;
pub mod models;
