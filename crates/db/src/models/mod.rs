pub mod academic;
pub mod event;
pub mod finance;
