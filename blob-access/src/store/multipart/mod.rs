pub mod local;
pub mod s3;
pub mod store;

pub use store::{MultipartStorage, MultipartStores};
