pub mod booking;
pub mod catalog;
pub mod reference;
pub mod validation;
