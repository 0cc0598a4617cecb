mod error;
mod store;

pub use error::SizeMismatchErr;
pub use store::SharedParams;
