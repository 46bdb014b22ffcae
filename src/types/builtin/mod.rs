//! Built-in node type catalogue.
//!
//! A generic set covering value entry, arithmetic, terminal output nodes, and
//! the higher-order per-entry dataset mapping node. Domain-specific catalogues
//! register their own types through [`RegistryBuilder::register`].

use std::sync::Arc;

use crate::types::registry::RegistryBuilder;

pub mod dataset;
pub mod primitives;

pub use dataset::{DatasetInputType, DatasetOutputType, EditEntriesType};
pub use primitives::{
    NumberInputType, NumberOutputType, StringInputType, StringOutputType, SumType,
};

pub(crate) fn register_default_types(builder: &mut RegistryBuilder) {
    builder
        .register(Arc::new(StringInputType))
        .register(Arc::new(NumberInputType))
        .register(Arc::new(SumType))
        .register(Arc::new(StringOutputType))
        .register(Arc::new(NumberOutputType))
        .register(Arc::new(DatasetInputType))
        .register(Arc::new(DatasetOutputType))
        .register(Arc::new(EditEntriesType));
}
