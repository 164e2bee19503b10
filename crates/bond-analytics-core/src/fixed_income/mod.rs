pub mod analysis;
pub mod bonds;
pub mod bootstrap;
pub mod duration;
pub mod pricing;
pub mod schedule;
pub mod yields;
