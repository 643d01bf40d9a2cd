pub mod brush;
pub mod fill;
pub mod filters;
pub mod mask;
