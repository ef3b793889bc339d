pub mod report;
pub mod settings;
pub mod transaction;
pub mod view;
