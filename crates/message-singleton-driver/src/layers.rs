mod message_layer;
mod singleton_layer;

pub use message_layer::*;
pub use singleton_layer::*;
