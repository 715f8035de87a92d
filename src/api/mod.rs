//! API handlers for the Biblios REST endpoints

pub mod admin;
pub mod books;
pub mod health;
pub mod loans;
pub mod openapi;
