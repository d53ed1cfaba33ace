pub mod app;

pub use app::{make_broken_storage_app, make_test_app};
