pub mod api;
pub mod common;
pub mod db;
pub mod memory;
pub mod pagination;
pub mod postgres;
