use metrics::counter;
use metrics::histogram;
use metrics::SharedString;

/// Prometheus-facing counters of the HTTP adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Metrics {}

impl Metrics {
    pub fn new() -> Self {
        Self {}
    }

    /// `kind` is either `alias` or `pointer`.
    pub fn increment_resolutions(&self, kind: &'static str) {
        counter!("dynacid_resolutions_total", "kind" => kind).increment(1);
    }

    pub fn increment_errors(&self, error: &'static str) {
        let error = SharedString::from(error);
        counter!("dynacid_resolution_errors_total", "error" => error).increment(1);
    }

    pub fn observe_resolution_duration(&self, duration: f64) {
        histogram!("dynacid_resolution_duration_seconds").record(duration);
    }

    pub fn increment_aliases_registered(&self) {
        counter!("dynacid_aliases_registered_total").increment(1);
    }

    pub fn increment_aliases_updated(&self) {
        counter!("dynacid_aliases_updated_total").increment(1);
    }
}
