pub mod blit;
pub mod pins;
pub mod points;
