pub mod task;
pub mod category;
pub mod store;
pub mod config;

pub use task::*;
pub use category::*;
pub use store::*;
pub use config::*;
