pub mod app;
pub mod host;
pub mod object;
pub mod render;
pub mod resource;
pub mod stack;
