pub mod ca;
pub mod tsp;

use fastrand::Rng;
use logosim::engine::events::UiEvent;
use logosim::error::{SimError, SimResult};

pub fn make_rng(seed: Option<u64>) -> Rng {
    match seed {
        Some(s) => Rng::with_seed(s),
        None => Rng::new(),
    }
}

/// A scripted `go` only returns through `done()`, so a run limit is required.
pub fn require_limit(events: &str, limit: usize, name: &str) -> SimResult<()> {
    let has_go = events
        .split(',')
        .any(|t| UiEvent::parse(t.trim()) == UiEvent::Go);
    if has_go && limit == 0 {
        return Err(SimError::Config(format!(
            "--{} must be positive when the script contains 'go'",
            name
        )));
    }
    Ok(())
}
