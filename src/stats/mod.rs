mod int_histogram;
mod string_histogram;
mod table_stats;

pub use int_histogram::IntHistogram;
pub use string_histogram::StringHistogram;
pub use table_stats::{compute_statistics, TableStats, IO_COST_PER_PAGE, NUM_HIST_BINS};
