#![doc = include_str!("../README.md")]

pub mod agent;
pub mod api;
pub mod logger;
pub mod util;

#[cfg(test)]
mod test_support;
