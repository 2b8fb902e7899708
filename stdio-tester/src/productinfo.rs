//! Information about this project.

/// The formal name of this product.
pub const PRODUCT_NAME: &str = "stdio-tester";

/// The version of the product, in string form.
pub const PRODUCT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The repository URI to display when asking for bug reports.
pub const PRODUCT_REPO: &str = env!("CARGO_PKG_REPOSITORY");
