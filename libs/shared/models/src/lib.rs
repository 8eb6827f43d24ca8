pub mod error;
pub mod product;

pub use error::{error_response, AppError};
pub use product::Product;
