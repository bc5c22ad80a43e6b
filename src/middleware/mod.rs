//! 中间件

mod cors;

pub use cors::Cors;
