//! Counter service exports.

pub mod counter;

pub use counter::CounterService;
