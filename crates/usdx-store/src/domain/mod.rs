pub mod cache;
pub mod errors;
pub mod key;
pub mod state;

pub use cache::*;
pub use errors::*;
pub use key::*;
pub use state::*;
