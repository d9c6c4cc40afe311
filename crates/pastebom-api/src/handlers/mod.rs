pub mod bom;
pub mod index;
pub mod upload;
