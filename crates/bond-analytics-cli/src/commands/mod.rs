pub mod batch;
pub mod bond;
pub mod curve;
