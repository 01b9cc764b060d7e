pub mod intake;
pub mod scholar;
