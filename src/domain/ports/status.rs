//! Status port: per-list loading/error channel

use std::sync::Arc;

/// Receives loading and error transitions of one pagination engine.
///
/// Injected per engine so that lists never share a global loading flag.
pub trait StatusSink: Send + Sync {
    fn loading_changed(&self, loading: bool);
    fn error_changed(&self, error: Option<&str>);
}

pub type SharedStatusSink = Arc<dyn StatusSink>;
