pub mod epoch_stats;
pub mod loop_fn;
pub mod parallel;
pub mod train_config;
pub mod trainer;

pub use epoch_stats::EpochStats;
pub use loop_fn::{evaluate_accuracy, evaluate_loss, train_loop, train_loop_shared};
pub use parallel::{run_parallel_epoch, shard_ranges};
pub use train_config::TrainConfig;
