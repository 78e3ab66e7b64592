//! Seeded, constraint-driven generation of practice questions from templates.
//!
//! ```
//! use itemgen::{generate, Template};
//!
//! let template: Template = serde_json::from_str(r#"{
//!     "stem": "What is {{x}} doubled?",
//!     "params": {"x": {"min": 1, "max": 3}},
//!     "constraints": ["x != 2"],
//!     "answer": "x*2",
//!     "distractors": ["x*3", "ans + 1"]
//! }"#).unwrap();
//!
//! let item = generate(&template, "s1").unwrap();
//! assert_ne!(item.params.get("x").unwrap().to_string(), "2");
//! ```

pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{local::LocalBankStorage, toml_config::RunConfig};

pub use crate::core::{
    batch::{BatchEngine, SnapshotRecord, ValidationReport},
    expr::{evaluate, Expression},
    generator::{generate, MAX_ITEM_ATTEMPTS},
    render::render,
    rng::{make_rng, SeededRng},
    sampler::{sample, MAX_SAMPLE_ATTEMPTS},
};
pub use crate::domain::model::{BankEntry, GeneratedItem, OrderedMap, ParamSpec, Scope, Template, Value};
pub use crate::utils::error::{ItemGenError, Result};
