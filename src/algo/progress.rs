//! Progress reporting for the harmonic pipeline.
//!
//! A solve runs through five [`Stage`]s. Callers that want feedback (the
//! CLI progress bar, for instance) pass a [`Progress`] callback, which is
//! invoked once at the start of every stage.
//!
//! # Example
//!
//! ```
//! use harmonic::algo::progress::{Progress, Stage};
//!
//! let progress = Progress::new(|current, total, message| {
//!     println!("[{}/{}] {}", current + 1, total, message);
//! });
//! progress.stage(Stage::Assembly);
//! ```

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Vertex-to-triangle incidence.
    Topology,
    /// Ordered first rings.
    Rings,
    /// Cotangent Laplacian assembly.
    Assembly,
    /// Boundary conditions.
    Constraints,
    /// Factorization and solve.
    Solve,
}

impl Stage {
    /// All stages in order.
    pub const ALL: [Stage; 5] = [
        Stage::Topology,
        Stage::Rings,
        Stage::Assembly,
        Stage::Constraints,
        Stage::Solve,
    ];

    /// Zero-based position of the stage.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable description.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Topology => "Building vertex-face incidence",
            Stage::Rings => "Ordering first rings",
            Stage::Assembly => "Assembling cotangent Laplacian",
            Stage::Constraints => "Applying boundary conditions",
            Stage::Solve => "Factorizing and solving",
        }
    }
}

/// A progress callback that receives updates during a solve.
///
/// The callback receives:
/// - `current`: Current step (0-based)
/// - `total`: Total number of steps
/// - `message`: Description of the current operation
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report the start of a pipeline stage.
    #[inline]
    pub fn stage(&self, stage: Stage) {
        self.report(stage.index(), Stage::ALL.len(), stage.label());
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_stage_reports() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |current, total, _| {
            sink.lock().unwrap().push((current, total));
        });

        for stage in Stage::ALL {
            progress.stage(stage);
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[0], (0, 5));
        assert_eq!(seen[4], (4, 5));
    }

    #[test]
    fn test_stage_order() {
        assert!(Stage::Topology < Stage::Solve);
        assert_eq!(Stage::Constraints.index(), 3);
    }
}
