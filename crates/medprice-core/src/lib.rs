#![deny(clippy::all)]

pub use crate::error::*;
pub use crate::model::*;
pub use crate::scraper::*;
pub use crate::selectors::Selectors;

mod error;
mod model;
pub mod scraper;
mod selectors;

pub use serde::{Deserialize, Serialize};
