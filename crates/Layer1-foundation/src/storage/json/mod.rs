mod store;

pub use store::{JsonStore, KILN_DIR};
