use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::debug;

use crate::{
    AgentflowError, Result,
    common::Shutdown,
    suggest::{Suggestion, SuggestionAdapter, SuggestionInput},
};

/// One "suggest workflow" form.
///
/// Allows a single request in flight and abandons the pending result once the
/// form is unmounted.
pub struct SuggestionForm {
    adapter: Arc<SuggestionAdapter>,
    in_flight: AtomicBool,
    unmounted: Shutdown,
}

/// Clears the in-flight flag however the submission ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SuggestionForm {
    pub fn new(adapter: Arc<SuggestionAdapter>) -> Self {
        Self {
            adapter,
            in_flight: AtomicBool::new(false),
            unmounted: Shutdown::new(),
        }
    }

    /// Submit the form.
    ///
    /// Fails with [`AgentflowError::Busy`] while another submission is
    /// outstanding and with [`AgentflowError::Cancelled`] when the form is
    /// unmounted before the suggestion arrives.
    pub async fn submit(
        &self,
        input: &SuggestionInput,
    ) -> Result<Suggestion> {
        if self.unmounted.is_shutdown() {
            return Err(AgentflowError::Cancelled);
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(AgentflowError::Busy);
        }
        let _guard = InFlight(&self.in_flight);

        tokio::select! {
            _ = self.unmounted.wait() => {
                debug!("suggest::cancelled");
                Err(AgentflowError::Cancelled)
            }
            suggestion = self.adapter.suggest(input) => Ok(suggestion),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        self.unmounted.shutdown();
    }
}

impl Drop for SuggestionForm {
    fn drop(&mut self) {
        self.unmount();
    }
}
