pub mod batch;
pub mod engine;
pub mod error;
pub mod normalizer;
pub mod sensor_catalog;
pub mod table;
