use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Queue depth at which producers are warned, once, but still accepted.
pub const DEFAULT_WARN_THRESHOLD: usize = 10_000;

/// Queue depth beyond which records are dropped.
pub const DEFAULT_ERROR_THRESHOLD: usize = 1_000_000;

const MIN_DEPTH_WIDTH: usize = 4;

/// Verdict for one record given the queue depth observed at admission
/// time.
///
/// The notice flags request one-time notices written directly to the
/// sink, bypassing the queue; both can be set on the same verdict when a
/// single record crosses both thresholds at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Whether the record may be pushed.
    pub accept: bool,
    pub warn_notice: bool,
    pub error_notice: bool,
}

/// Two-tier depth policy deciding accept/drop per record.
///
/// Depth is sampled by the producer before the push, so the observed
/// value and the depth at the actual push may differ slightly under
/// concurrent producers; the policy is advisory and this is accepted
/// rather than corrected. The sticky notice flags only transition
/// false-to-true here and are re-armed solely through the explicit
/// reset calls.
pub struct AdmissionController {
    warn_threshold: AtomicUsize,
    error_threshold: AtomicUsize,
    warn_tripped: AtomicBool,
    error_tripped: AtomicBool,
    depth_width: AtomicUsize,
}

impl AdmissionController {
    pub fn new(warn_threshold: usize, error_threshold: usize) -> Self {
        AdmissionController {
            warn_threshold: AtomicUsize::new(warn_threshold),
            error_threshold: AtomicUsize::new(error_threshold),
            warn_tripped: AtomicBool::new(false),
            error_tripped: AtomicBool::new(false),
            depth_width: AtomicUsize::new(compute_depth_width(error_threshold)),
        }
    }

    /// Judge one record against the observed queue depth.
    pub fn admit(&self, current_depth: usize) -> Admission {
        let mut verdict = Admission {
            accept: true,
            warn_notice: false,
            error_notice: false,
        };

        if current_depth > self.warn_threshold.load(Ordering::Relaxed)
            && !self.warn_tripped.swap(true, Ordering::Relaxed)
        {
            verdict.warn_notice = true;
        }

        if current_depth > self.error_threshold.load(Ordering::Relaxed) {
            verdict.accept = false;
            verdict.error_notice = !self.error_tripped.swap(true, Ordering::Relaxed);
        }

        verdict
    }

    pub fn warn_threshold(&self) -> usize {
        self.warn_threshold.load(Ordering::Relaxed)
    }

    pub fn set_warn_threshold(&self, depth: usize) -> usize {
        self.warn_threshold.store(depth, Ordering::Relaxed);
        depth
    }

    pub fn error_threshold(&self) -> usize {
        self.error_threshold.load(Ordering::Relaxed)
    }

    /// Replace the drop threshold. Also recomputes the zero-pad width
    /// used for queue-depth fields in message prefixes, so depth
    /// counters stay aligned as capacity scales.
    pub fn set_error_threshold(&self, depth: usize) -> usize {
        self.error_threshold.store(depth, Ordering::Relaxed);
        self.depth_width
            .store(compute_depth_width(depth), Ordering::Relaxed);
        depth
    }

    /// Re-arm the one-time warn notice.
    pub fn reset_warn_flag(&self) {
        self.warn_tripped.store(false, Ordering::Relaxed);
    }

    /// Re-arm the one-time error notice.
    pub fn reset_error_flag(&self) {
        self.error_tripped.store(false, Ordering::Relaxed);
    }

    pub fn warn_tripped(&self) -> bool {
        self.warn_tripped.load(Ordering::Relaxed)
    }

    pub fn error_tripped(&self) -> bool {
        self.error_tripped.load(Ordering::Relaxed)
    }

    /// Zero-pad width for depth fields in message prefixes.
    pub fn depth_width(&self) -> usize {
        self.depth_width.load(Ordering::Relaxed)
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_THRESHOLD, DEFAULT_ERROR_THRESHOLD)
    }
}

fn compute_depth_width(error_threshold: usize) -> usize {
    let digits = (error_threshold as f64).log10().ceil() as usize;
    digits.max(MIN_DEPTH_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(verdict: Admission) -> bool {
        !verdict.warn_notice && !verdict.error_notice
    }

    #[test]
    fn accepts_below_both_thresholds() {
        let admission = AdmissionController::new(2, 5);
        let verdict = admission.admit(0);
        assert!(verdict.accept && quiet(verdict));
        let verdict = admission.admit(2);
        assert!(verdict.accept && quiet(verdict));
        assert!(!admission.warn_tripped());
    }

    #[test]
    fn warn_notice_fires_once_until_reset() {
        let admission = AdmissionController::new(2, 5);
        assert!(admission.admit(3).warn_notice);
        assert!(!admission.admit(4).warn_notice);
        admission.reset_warn_flag();
        assert!(admission.admit(3).warn_notice);
    }

    #[test]
    fn drop_starts_strictly_above_the_error_threshold() {
        let admission = AdmissionController::new(2, 5);
        // Depth equal to the threshold is still accepted.
        assert!(admission.admit(5).accept);

        let verdict = admission.admit(6);
        assert!(!verdict.accept && verdict.error_notice);
        let verdict = admission.admit(7);
        assert!(!verdict.accept && !verdict.error_notice);

        admission.reset_error_flag();
        assert!(admission.admit(6).error_notice);
    }

    #[test]
    fn crossing_both_thresholds_raises_both_notices() {
        let admission = AdmissionController::new(2, 5);
        // First record ever judged lands beyond both thresholds: the warn
        // flag trips on the same call that drops the record.
        let verdict = admission.admit(9);
        assert!(!verdict.accept);
        assert!(verdict.warn_notice);
        assert!(verdict.error_notice);
    }

    #[test]
    fn depth_width_follows_the_error_threshold() {
        let admission = AdmissionController::default();
        assert_eq!(admission.depth_width(), 6); // 1_000_000

        admission.set_error_threshold(100);
        assert_eq!(admission.depth_width(), 4); // clamped to the minimum

        admission.set_error_threshold(100_000_000);
        assert_eq!(admission.depth_width(), 8);
    }
}
