pub mod bia;
pub mod catalog;
pub mod core;
pub mod dashboard;
pub mod evaluations;
pub mod history;
pub mod main_module;
pub mod organizations;
pub mod scoring;
pub mod store;
