pub mod dataset;
pub mod frame;
