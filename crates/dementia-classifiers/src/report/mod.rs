pub mod plots;
pub mod report;
pub mod summary;
