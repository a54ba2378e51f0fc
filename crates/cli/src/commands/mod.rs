pub mod keys;
pub mod migrate;
