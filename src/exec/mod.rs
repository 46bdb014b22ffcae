pub mod execute;
pub mod meta;
pub mod process;
pub mod validate;

pub use execute::GraphExecutor;
pub use meta::MetaResolver;
pub use process::{CalculationProcess, CalculationTracker, ProcessState};
pub use validate::{is_meta_valid, validate_execution};
