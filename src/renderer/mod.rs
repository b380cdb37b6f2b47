pub mod face;
pub mod glyphs;

pub use face::FaceStyle;
