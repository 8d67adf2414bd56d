mod conditions;
mod constants;
mod load_clvm;
mod puzzles;
mod template;

pub use conditions::*;
pub use constants::*;
pub use load_clvm::*;
pub use puzzles::*;
pub use template::*;
