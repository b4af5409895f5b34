pub mod bits;
pub mod channel;
pub mod console;
pub mod error;
pub mod frame;
pub mod progress;
pub mod radio;
pub mod source;
pub mod sym;
pub mod tx;

pub use error::{Error, Result};
