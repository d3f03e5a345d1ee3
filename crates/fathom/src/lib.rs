#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fathom-finance/fathom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod pipeline;

// Re-export main types from sub-crates
pub use fathom_inputs as inputs;
pub use fathom_model as model;
pub use fathom_output as output;
pub use fathom_valuation as valuation;

pub use pipeline::{Analysis, ModelRequest, Pipeline, PipelineConfig, PipelineError};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
