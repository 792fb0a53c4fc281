pub mod category;
pub mod response;
pub mod rule;

pub use category::*;
pub use response::*;
pub use rule::*;
