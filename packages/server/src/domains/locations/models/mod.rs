pub mod location;
pub mod zip_code;

pub use location::Location;
pub use zip_code::{ZipCode, ZipCodeTableGeocoder};
