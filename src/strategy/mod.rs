// Scanning strategies

pub mod direct;
pub mod parallel;
pub mod streaming;

pub use direct::*;
pub use parallel::*;
pub use streaming::*;
