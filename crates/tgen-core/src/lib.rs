pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod filter;
pub mod generator;
pub mod harness;
pub mod invoker;
pub mod naming;
pub mod support;
pub mod template;

pub use catalog::{BuiltinDescriptors, Catalog, LoadPolicy};
pub use config::Config;
pub use descriptor::TestDescriptor;
pub use generator::{Generator, RunOutcome};
pub use naming::GrammarNames;
