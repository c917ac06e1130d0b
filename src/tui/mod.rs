pub mod detail_overlay;
pub mod footer;
pub mod header;
pub mod list;
pub mod render;
pub mod spinner;
