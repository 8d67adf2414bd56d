mod launcher;
mod singleton_state;

pub use launcher::*;
pub use singleton_state::*;
