pub mod item;
pub mod ping;
pub mod zone;
