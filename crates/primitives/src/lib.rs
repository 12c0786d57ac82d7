#![cfg_attr(not(test), no_std)]

mod ids;

pub use ids::{ColId, TableId};
