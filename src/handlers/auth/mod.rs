pub mod register;
pub mod session;
pub mod utils;

pub use register::register;
pub use session::{login, refresh};
