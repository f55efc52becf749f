pub mod ai;
pub mod config;
pub mod game;
pub mod report;
