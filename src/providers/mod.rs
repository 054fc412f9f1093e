//! Data sources for product listings and inventory.

mod nvidia;
mod traits;

pub use nvidia::NvidiaApiSource;
#[cfg(test)]
pub use traits::MockProductDataSource;
pub use traits::{DataSourceError, ProductDataSource};
