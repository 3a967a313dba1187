pub mod election;
pub mod repository;
