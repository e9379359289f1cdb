pub mod bootstrap;
pub mod config;
pub mod cycle;
pub mod dashboard;
pub mod event_bus;
pub mod match_runner;
pub mod notifier;
pub mod persistence;
pub mod scheduler;
pub mod shutdown;
pub mod simulation;
