pub mod config;
pub mod reconcile;
pub mod run;
pub mod scan;
