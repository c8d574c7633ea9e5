//! Candlestick classifiers
//!
//! - [`helpers`]: shape and trend predicates with their default thresholds.
//! - [`inverted_hammer`]: the Inverted Hammer detector used by the scanner.

pub mod helpers;
pub mod inverted_hammer;

pub use helpers::*;
pub use inverted_hammer::*;
