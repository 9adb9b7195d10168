//! Scan workflow and delivery list management

pub mod delivery_list;
pub mod progress;
pub mod scan_workflow;

pub use delivery_list::{delivery_channel, sample_deliveries, DeliveryList, DurationEstimator};
pub use progress::{ProgressCallback, ProgressReporter};
pub use scan_workflow::{ScanSettings, ScanWorkflow};
