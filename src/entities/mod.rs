pub mod client;
pub mod enums;
pub mod group;
pub mod locality;
pub mod order;
pub mod order_line;
pub mod product;
pub mod session_record;
pub mod user;
pub mod user_group;

pub use enums::{Category, Region, Segment};
