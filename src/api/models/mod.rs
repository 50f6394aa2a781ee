pub mod employees;
pub mod modules;

pub use employees::*;
pub use modules::*;
