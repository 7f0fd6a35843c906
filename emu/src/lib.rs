pub mod config;
pub mod device;
pub mod exec;
pub mod machine;
pub mod memory;
pub mod state;
pub mod syscall;

pub use machine::Machine;
