pub mod gene_size;
pub mod labels;
pub mod sources;
pub mod validation;
