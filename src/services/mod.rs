pub mod media;
pub mod room;
