pub mod cache;
pub mod dataset;
pub mod view;

pub use cache::DataCache;
pub use dataset::Dataset;
pub use view::{DashboardView, Filter};
