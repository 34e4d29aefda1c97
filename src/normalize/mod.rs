//! Expression preprocessing.
//!
//! - **log2**: `log2(x + 1)` transform
//! - **quantile**: quantile normalization across samples
//! - **clean**: replacement of NaN / infinite values

pub mod clean;
pub mod log2;
pub mod quantile;

pub use clean::clean_nonfinite;
pub use log2::norm_log2;
pub use quantile::norm_quantile;
