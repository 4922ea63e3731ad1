pub mod interchange;
pub mod render;
