pub mod engine;
pub mod output_handler;
pub mod packet;
pub mod task_info;
pub mod task_runner;
