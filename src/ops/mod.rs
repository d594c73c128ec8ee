pub mod category_ops;
pub mod sweep;
pub mod task_ops;
pub mod views;
