pub mod solve_service;

pub use solve_service::*;
