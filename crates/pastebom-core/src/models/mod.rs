//! Data models shared between the generator, the artifact store and the HTTP layer.

mod artifact;

pub use artifact::*;
