pub mod classifier;
pub mod coordinator;
pub mod report;
pub mod resolver;

pub use coordinator::{ScanResult, Scanner};
pub use resolver::{OverrideResolver, PropertyOverride};
