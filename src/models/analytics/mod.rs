pub mod dataset;
pub mod requests;
pub mod responses;

pub use dataset::{ReportDataset, ReportUser};
pub use requests::{GroupLevel, ReportScope, ScopeParams};
pub use responses::*;
