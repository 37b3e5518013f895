pub mod enums;
mod adherence_log;
mod medicine;
mod user;

pub use adherence_log::*;
pub use medicine::*;
pub use user::*;
