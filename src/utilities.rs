pub mod grid;
pub mod sampling;

pub use sampling::{ceil_even, linspace, next_pow2};
