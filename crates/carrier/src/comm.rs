//! Cross-subdomain reduction.
//!
//! Decomposed runs need one collective sum when an injector resolves its
//! patch: every rank contributes its local patch area, including zero
//! when it owns no faces. A rank that skipped the call would deadlock a
//! real collective, so resolution always reduces, even over an empty
//! local view.

/// Blocking sum-reduction across all subdomains.
pub trait Reduce {
    fn global_sum(&self, local: f64) -> f64;
}

/// Single-domain runs: the local value already is the global value.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialComm;

impl Reduce for SerialComm {
    fn global_sum(&self, local: f64) -> f64 {
        local
    }
}
