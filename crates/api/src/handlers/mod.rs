pub mod dashboard;
pub mod scope;
