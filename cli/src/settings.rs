//! Tunables for the iterative centrality measures.
//!
//! Each setting is a command-line flag with an environment fallback, so a
//! shell profile can pin values for every invocation.

use clap::Args;
use gexf_query_core::CentralityOptions;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("damping must be strictly between 0 and 1, got {0}")]
    DampingOutOfRange(f64),

    #[error("{0} must be at least 1")]
    ZeroIterations(&'static str),

    #[error("tolerance must be positive, got {0}")]
    NonPositiveTolerance(f64),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// PageRank damping factor.
    #[arg(long, env = "GFX_PAGERANK_DAMPING", default_value_t = 0.85)]
    pub damping: f64,

    /// PageRank iteration cap.
    #[arg(long, env = "GFX_PAGERANK_MAX_ITER", default_value_t = 100)]
    pub pagerank_max_iter: usize,

    /// Eigenvector power-iteration cap before the dense solver takes over.
    #[arg(long, env = "GFX_EIGENVECTOR_MAX_ITER", default_value_t = 1000)]
    pub eigenvector_max_iter: usize,

    /// Convergence tolerance for PageRank and eigenvector iteration.
    #[arg(long, env = "GFX_TOLERANCE", default_value_t = 1e-6)]
    pub tolerance: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        let defaults = CentralityOptions::default();
        Self {
            damping: defaults.pagerank_damping,
            pagerank_max_iter: defaults.pagerank_max_iter,
            eigenvector_max_iter: defaults.eigenvector_max_iter,
            tolerance: defaults.pagerank_tolerance,
        }
    }
}

impl AnalysisSettings {
    /// Validate and convert into engine options.
    pub fn options(&self) -> Result<CentralityOptions, SettingsError> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(SettingsError::DampingOutOfRange(self.damping));
        }
        if self.pagerank_max_iter == 0 {
            return Err(SettingsError::ZeroIterations("pagerank-max-iter"));
        }
        if self.eigenvector_max_iter == 0 {
            return Err(SettingsError::ZeroIterations("eigenvector-max-iter"));
        }
        if !(self.tolerance > 0.0) {
            return Err(SettingsError::NonPositiveTolerance(self.tolerance));
        }

        Ok(CentralityOptions {
            pagerank_damping: self.damping,
            pagerank_max_iter: self.pagerank_max_iter,
            pagerank_tolerance: self.tolerance,
            eigenvector_max_iter: self.eigenvector_max_iter,
            eigenvector_tolerance: self.tolerance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine() {
        let options = AnalysisSettings::default().options().unwrap();
        assert_eq!(options, CentralityOptions::default());
    }

    #[test]
    fn test_damping_bounds() {
        for damping in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            let settings = AnalysisSettings {
                damping,
                ..Default::default()
            };
            assert!(matches!(
                settings.options(),
                Err(SettingsError::DampingOutOfRange(_))
            ));
        }
    }

    #[test]
    fn test_iteration_caps() {
        let settings = AnalysisSettings {
            pagerank_max_iter: 0,
            ..Default::default()
        };
        assert_eq!(
            settings.options(),
            Err(SettingsError::ZeroIterations("pagerank-max-iter"))
        );

        let settings = AnalysisSettings {
            eigenvector_max_iter: 0,
            ..Default::default()
        };
        assert_eq!(
            settings.options(),
            Err(SettingsError::ZeroIterations("eigenvector-max-iter"))
        );
    }

    #[test]
    fn test_tolerance_positive() {
        let settings = AnalysisSettings {
            tolerance: 0.0,
            ..Default::default()
        };
        assert_eq!(settings.options(), Err(SettingsError::NonPositiveTolerance(0.0)));
    }

    #[test]
    fn test_custom_values_flow_through() {
        let settings = AnalysisSettings {
            damping: 0.5,
            pagerank_max_iter: 20,
            eigenvector_max_iter: 50,
            tolerance: 1e-9,
        };
        let options = settings.options().unwrap();
        assert_eq!(options.pagerank_damping, 0.5);
        assert_eq!(options.pagerank_max_iter, 20);
        assert_eq!(options.eigenvector_max_iter, 50);
        assert_eq!(options.eigenvector_tolerance, 1e-9);
    }
}
