pub mod alert;
pub mod chat;
pub mod market;
pub mod response;

pub use alert::*;
pub use chat::*;
pub use market::*;
pub use response::*;
