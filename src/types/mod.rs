pub mod measure;
pub mod station;
