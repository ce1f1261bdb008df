//! Deterministic risk scoring over consolidated funding sources
//!
//! Each risky source contributes a fixed number of points, summed and
//! clamped to 0..=100. Points accrue once per source address, never per
//! transfer. A sanctioned source forces the critical level regardless of
//! the numeric score.

use serde::Deserialize;

use crate::types::{EntityClass, FundingSource, RiskFactor, RiskFactorKind, RiskLevel};

/// Ceiling the summed score is clamped to
pub const MAX_RISK_SCORE: u32 = 100;

/// Point weights for risk factors
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScoringConfig {
    /// Points per sanctioned source
    #[serde(default = "default_sanctioned_points")]
    pub sanctioned_source_points: u32,
    /// Points per non-sanctioned mixer or privacy source
    #[serde(default = "default_mixer_points")]
    pub mixer_source_points: u32,
    /// Points per unrecognized source beyond the direct funders
    #[serde(default = "default_unknown_deep_points")]
    pub unknown_deep_source_points: u32,
    /// Points per unrecognized direct funder
    #[serde(default = "default_unknown_points")]
    pub unknown_source_points: u32,
}

fn default_sanctioned_points() -> u32 {
    50
}

fn default_mixer_points() -> u32 {
    30
}

fn default_unknown_deep_points() -> u32 {
    10
}

fn default_unknown_points() -> u32 {
    5
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            sanctioned_source_points: default_sanctioned_points(),
            mixer_source_points: default_mixer_points(),
            unknown_deep_source_points: default_unknown_deep_points(),
            unknown_source_points: default_unknown_points(),
        }
    }
}

impl ScoringConfig {
    /// Check the severity ordering the levels are built on
    ///
    /// Sanctioned must outweigh mixer, mixer must outweigh deep unknown,
    /// and deep unknown must weigh at least as much as a direct unknown.
    pub fn validate(&self) -> crate::Result<()> {
        if self.sanctioned_source_points <= self.mixer_source_points {
            return Err(crate::Error::Config(
                "sanctioned_source_points must exceed mixer_source_points".to_string(),
            ));
        }
        if self.mixer_source_points <= self.unknown_deep_source_points {
            return Err(crate::Error::Config(
                "mixer_source_points must exceed unknown_deep_source_points".to_string(),
            ));
        }
        if self.unknown_deep_source_points < self.unknown_source_points {
            return Err(crate::Error::Config(
                "unknown_deep_source_points must be at least unknown_source_points".to_string(),
            ));
        }
        Ok(())
    }
}

/// Output of scoring one source set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    /// Clamped score in 0..=100
    pub score: u8,
    pub level: RiskLevel,
    pub factors: Vec<RiskFactor>,
}

/// Point-based risk scorer
#[derive(Debug, Clone)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score a consolidated source list
    pub fn score(&self, sources: &[FundingSource]) -> RiskAssessment {
        let mut factors: Vec<RiskFactor> = Vec::new();
        let mut any_sanctioned = false;

        for source in sources {
            let contribution = if source.is_sanctioned {
                any_sanctioned = true;
                Some((
                    RiskFactorKind::SanctionedSource,
                    self.config.sanctioned_source_points,
                ))
            } else {
                match source.class() {
                    EntityClass::Mixer => {
                        Some((RiskFactorKind::MixerSource, self.config.mixer_source_points))
                    }
                    EntityClass::Eoa | EntityClass::Unknown => {
                        if source.depth > 0 {
                            Some((
                                RiskFactorKind::UnknownDeepSource,
                                self.config.unknown_deep_source_points,
                            ))
                        } else {
                            Some((
                                RiskFactorKind::UnknownSource,
                                self.config.unknown_source_points,
                            ))
                        }
                    }
                    EntityClass::Exchange | EntityClass::Defi => None,
                }
            };

            if let Some((kind, points)) = contribution {
                // sanctioned factors are always recorded, even at zero weight
                if points > 0 || kind == RiskFactorKind::SanctionedSource {
                    factors.push(RiskFactor {
                        kind,
                        points,
                        source_address: source.address.clone(),
                    });
                }
            }
        }

        let raw = factors
            .iter()
            .fold(0u32, |acc, f| acc.saturating_add(f.points));
        let score = raw.min(MAX_RISK_SCORE) as u8;
        let level = if any_sanctioned {
            RiskLevel::Critical
        } else {
            bucket(score)
        };

        RiskAssessment {
            score,
            level,
            factors,
        }
    }
}

/// Map a clamped score to its discrete level
fn bucket(score: u8) -> RiskLevel {
    match score {
        0 => RiskLevel::None,
        1..=24 => RiskLevel::Low,
        25..=49 => RiskLevel::Medium,
        50..=74 => RiskLevel::High,
        _ => RiskLevel::Critical,
    }
}
