pub mod binding;
pub mod buffer_pool;
pub mod correction;
pub mod pdf;
pub mod scan;
pub mod scoring;

pub use binding::{BoundWavelet, DataBinding};
pub use buffer_pool::StackPool;
pub use correction::CorrectedData;
pub use pdf::PtPdf;
pub use scan::SourceScan;
pub use scoring::{BestSolution, Centroid, ScanResult};
