pub mod actions;
pub mod applications;
pub mod collector;
pub mod cpu;
pub mod history;
pub mod memory;
pub mod process;
pub mod services;

pub use collector::{Collector, Control, SamplingEngine};
