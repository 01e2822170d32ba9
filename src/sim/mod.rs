pub mod framework;
pub mod relaxation;
