//! Domain models

pub mod author;
pub mod book;
pub mod category;
pub mod loan;
pub mod member;
