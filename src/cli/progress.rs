//! CLI-specific progress handling for osm2routes
//!
//! Shows how many routes have been materialized so far.

use indicatif::{ProgressBar, ProgressStyle};

/// Creates a progress bar counting materialized routes
pub fn create_progress_bar(total_routes: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_routes);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} routes ({percent}%) ETA: {eta}")
            .expect("Failed to create progress style")
            .progress_chars("#>-")
    );
    pb
}

/// Progress manager for a resolution run
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_routes: u64, message: &str) -> Self {
        let pb = create_progress_bar(total_routes);

        // Print initial message to stderr
        eprintln!("{}", message);

        Self { pb }
    }

    /// Update from a (materialized, total) progress report
    pub fn update(&self, done: u64, total: u64) {
        if self.pb.length().unwrap_or(0) != total {
            self.pb.set_length(total);
        }
        self.pb.set_position(done);
        if total > 0 && done >= total {
            self.pb.finish_with_message("✅ All routes materialized");
        }
    }
}
