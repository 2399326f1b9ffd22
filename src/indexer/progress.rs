use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{AtlasError, Result};

/// Pipeline phases, reported in order. `Complete` fires exactly once per
/// run, including on an empty repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Extracting,
    Structure,
    Parsing,
    Communities,
    Processes,
    Complete,
}

impl ProgressPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressPhase::Extracting => "extracting",
            ProgressPhase::Structure => "structure",
            ProgressPhase::Parsing => "parsing",
            ProgressPhase::Communities => "communities",
            ProgressPhase::Processes => "processes",
            ProgressPhase::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    /// 0..=100
    pub percent: f64,
    pub detail: Option<String>,
}

/// Cooperative cancellation signal, checked at phase boundaries and on
/// every progress tick. No phase is interrupted mid-item.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

pub type ProgressCallback = Box<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Funnels phase/percent events to the host callback and surfaces
/// cancellation as an error so every phase can bail with `?`.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    cancel: CancelToken,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>, cancel: CancelToken) -> Self {
        Self { callback, cancel }
    }

    pub fn silent() -> Self {
        Self {
            callback: None,
            cancel: CancelToken::new(),
        }
    }

    /// Emits an event and checks for cancellation.
    pub fn report(&self, phase: ProgressPhase, percent: f64, detail: Option<&str>) -> Result<()> {
        self.check()?;
        if let Some(callback) = &self.callback {
            callback(&ProgressEvent {
                phase,
                percent: percent.clamp(0.0, 100.0),
                detail: detail.map(str::to_string),
            });
        }
        Ok(())
    }

    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(AtlasError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_report_invokes_callback() {
        let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::new(
            Some(Box::new(move |e| sink.lock().unwrap().push(e.clone()))),
            CancelToken::new(),
        );

        reporter
            .report(ProgressPhase::Extracting, 50.0, Some("10/20"))
            .unwrap();

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].phase, ProgressPhase::Extracting);
        assert_eq!(captured[0].percent, 50.0);
        assert_eq!(captured[0].detail.as_deref(), Some("10/20"));
    }

    #[test]
    fn test_percent_clamped() {
        let events: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::new(
            Some(Box::new(move |e| sink.lock().unwrap().push(e.percent))),
            CancelToken::new(),
        );
        reporter.report(ProgressPhase::Parsing, 150.0, None).unwrap();
        reporter.report(ProgressPhase::Parsing, -5.0, None).unwrap();
        assert_eq!(*events.lock().unwrap(), vec![100.0, 0.0]);
    }

    #[test]
    fn test_cancellation_surfaces_on_tick() {
        let cancel = CancelToken::new();
        let reporter = ProgressReporter::new(None, cancel.clone());

        assert!(reporter.report(ProgressPhase::Parsing, 10.0, None).is_ok());
        cancel.cancel();
        assert!(matches!(
            reporter.report(ProgressPhase::Parsing, 20.0, None),
            Err(AtlasError::Cancelled)
        ));
        assert!(matches!(reporter.check(), Err(AtlasError::Cancelled)));
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(ProgressPhase::Extracting.as_str(), "extracting");
        assert_eq!(ProgressPhase::Complete.as_str(), "complete");
    }
}
