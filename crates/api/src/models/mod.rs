pub mod class;
pub mod discovery;
pub mod marker;

pub use class::*;
pub use discovery::*;
pub use marker::*;
