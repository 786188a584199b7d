pub mod auth;
pub mod browser;
pub mod config;
pub mod gateway;
pub mod listing;
pub mod navigation;
pub mod storage;
pub mod transfer;
pub mod upload;
pub mod view;
