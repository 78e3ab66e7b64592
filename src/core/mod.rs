pub mod batch;
pub mod expr;
pub mod generator;
pub mod render;
pub mod rng;
pub mod sampler;

pub use crate::domain::model::{GeneratedItem, Scope, Template, Value};
pub use crate::domain::ports::{BankStorage, ConfigProvider};
pub use crate::utils::error::Result;
