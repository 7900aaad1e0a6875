pub mod config;
pub mod countdown;
pub mod history;
pub mod plan;
pub mod protocol;
pub mod run;
