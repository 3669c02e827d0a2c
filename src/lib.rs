pub mod aggregate;
pub mod config;
pub mod output;
pub mod stats;
pub mod table;

#[cfg(test)]
pub(crate) mod test_helpers;
