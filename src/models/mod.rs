pub mod common;
pub mod message;
pub mod request;

pub use common::*;
pub use message::*;
pub use request::*;
