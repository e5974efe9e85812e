pub mod common;

mod coordinator_cycle;
