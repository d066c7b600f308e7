pub mod message;
pub mod snippet;
pub mod step;
pub mod survey;
pub mod user;

pub use message::*;
pub use snippet::*;
pub use step::*;
pub use survey::*;
pub use user::*;
