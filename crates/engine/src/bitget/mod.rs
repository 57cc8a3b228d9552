pub mod rest;

pub use rest::BitgetClient;
