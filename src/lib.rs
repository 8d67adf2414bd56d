pub mod prelude;

pub use message_singleton_coinset as coinset;
pub use message_singleton_driver as driver;
pub use message_singleton_test as test;
pub use message_singleton_types as types;
