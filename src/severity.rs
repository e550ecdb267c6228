/// Casualty and damage figures.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamageSeverity {
    pub deaths: f64,
    pub injuries: f64,
    pub property_damage_usd: f64,
    pub crop_damage_usd: f64,
}

impl DamageSeverity {
    /// Weighted impact before the minimum is applied.
    ///
    /// Negative or non-finite fields count as zero.
    pub fn raw_score(&self) -> f64 {
        let clean = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        10.0 * clean(self.deaths)
            + 2.0 * clean(self.injuries)
            + 5.0 * (clean(self.property_damage_usd) / 1e9)
            + 2.0 * (clean(self.crop_damage_usd) / 1e9)
    }

    pub fn score(&self, min_score: f64) -> f64 {
        self.raw_score().max(min_score)
    }
}

/// CAP severity as used by NWS alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertSeverity {
    Unknown,
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl AlertSeverity {
    /// Case-insensitive parse; anything unrecognized is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "extreme" => Self::Extreme,
            "severe" => Self::Severe,
            "moderate" => Self::Moderate,
            "minor" => Self::Minor,
            _ => Self::Unknown,
        }
    }

    /// Ordinal bucket 1..=4, `None` for `Unknown`.
    pub fn ordinal(self) -> Option<u8> {
        match self {
            Self::Unknown => None,
            Self::Minor => Some(1),
            Self::Moderate => Some(2),
            Self::Severe => Some(3),
            Self::Extreme => Some(4),
        }
    }
}

/// CAP urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    Immediate,
    Expected,
    Future,
    Past,
    Unknown,
}

impl Urgency {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "immediate" => Self::Immediate,
            "expected" => Self::Expected,
            "future" => Self::Future,
            "past" => Self::Past,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoricalSeverity {
    pub severity: AlertSeverity,
    pub urgency: Urgency,
}

impl CategoricalSeverity {
    pub fn from_labels(severity: &str, urgency: Option<&str>) -> Self {
        Self {
            severity: AlertSeverity::from_label(severity),
            urgency: urgency.map_or(Urgency::Unknown, Urgency::from_label),
        }
    }
}

/// Impact data in whichever shape the feed provides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeverityInput {
    Damage(DamageSeverity),
    Categorical(CategoricalSeverity),
}

/// Color band used to style a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeverityBand {
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityBand {
    /// Bands a position within the observed score range.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.75 {
            Self::Critical
        } else if ratio >= 0.5 {
            Self::High
        } else if ratio >= 0.25 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn from_alert(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::Extreme => Self::Critical,
            AlertSeverity::Severe => Self::High,
            AlertSeverity::Moderate => Self::Medium,
            AlertSeverity::Minor => Self::Low,
            AlertSeverity::Unknown => Self::Unknown,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "#22c55e",
            Self::Medium => "#eab308",
            Self::High => "#f97316",
            Self::Critical => "#ef4444",
            Self::Unknown => "#9ca3af",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Low => "info",
            Self::Medium => "alert-circle",
            Self::High => "alert-triangle",
            Self::Critical => "flame",
            Self::Unknown => "help-circle",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }
}

/// Min and max damage score over a record set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    pub fn from_scores(scores: impl IntoIterator<Item = f64>) -> Option<Self> {
        scores.into_iter().fold(None, |range, s| {
            Some(match range {
                None => Self { min: s, max: s },
                Some(r) => Self {
                    min: r.min.min(s),
                    max: r.max.max(s),
                },
            })
        })
    }

    /// Position of `score` in the range, `0.0` when the range is flat.
    pub fn ratio(&self, score: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 || !span.is_finite() {
            return 0.0;
        }
        ((score - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Result of scoring one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Assessment {
    Scored { score: f64 },
    Categorical(CategoricalSeverity),
}

pub fn assess(input: &SeverityInput, min_score: f64) -> Assessment {
    match input {
        SeverityInput::Damage(damage) => Assessment::Scored {
            score: damage.score(min_score),
        },
        SeverityInput::Categorical(cat) => Assessment::Categorical(*cat),
    }
}

/// Visual styling derived from an assessment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub band: SeverityBand,
    pub color: &'static str,
    pub icon: &'static str,
    /// Marker radius in pixels.
    pub radius: f64,
    /// Set for alerts requiring immediate action.
    pub pulse: bool,
    /// Damage score, absent for categorical assessments.
    pub score: Option<f64>,
}

impl MarkerStyle {
    fn new(band: SeverityBand, radius: f64, pulse: bool, score: Option<f64>) -> Self {
        Self {
            band,
            color: band.color(),
            icon: band.icon(),
            radius,
            pulse,
            score,
        }
    }
}

/// Styles an assessment. Damage scores are banded against `range`.
pub fn style(assessment: &Assessment, range: Option<ScoreRange>) -> MarkerStyle {
    match assessment {
        Assessment::Scored { score } => {
            let ratio = range.map_or(0.0, |r| r.ratio(*score));
            MarkerStyle::new(
                SeverityBand::from_ratio(ratio),
                6.0 + 18.0 * ratio,
                false,
                Some(*score),
            )
        }
        Assessment::Categorical(cat) => {
            let radius = cat.severity.ordinal().map_or(6.0, |o| 4.0 + 4.0 * f64::from(o));
            MarkerStyle::new(
                SeverityBand::from_alert(cat.severity),
                radius,
                cat.urgency == Urgency::Immediate,
                None,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MIN_SEVERITY_SCORE;

    fn damage(deaths: f64, injuries: f64, property: f64, crops: f64) -> DamageSeverity {
        DamageSeverity {
            deaths,
            injuries,
            property_damage_usd: property,
            crop_damage_usd: crops,
        }
    }

    #[test]
    fn weighted_formula() {
        let d = damage(5.0, 10.0, 2_000_000_000.0, 0.0);
        assert_eq!(d.score(MIN_SEVERITY_SCORE), 80.0);

        let d = damage(0.0, 0.0, 0.0, 3_000_000_000.0);
        assert_eq!(d.score(0.0), 6.0);
    }

    #[test]
    fn zero_impact_gets_the_floor() {
        assert_eq!(DamageSeverity::default().score(MIN_SEVERITY_SCORE), 10.0);
        assert_eq!(damage(-3.0, f64::NAN, 0.0, 0.0).score(MIN_SEVERITY_SCORE), 10.0);
    }

    #[test]
    fn scores_are_monotonic_above_the_floor() {
        let base = damage(2.0, 3.0, 1e9, 1e9);
        let bumps = [
            damage(3.0, 3.0, 1e9, 1e9),
            damage(2.0, 4.0, 1e9, 1e9),
            damage(2.0, 3.0, 2e9, 1e9),
            damage(2.0, 3.0, 1e9, 2e9),
        ];
        let floor = MIN_SEVERITY_SCORE;
        for b in bumps {
            assert!(b.score(floor) > base.score(floor), "{b:?}");
        }
        assert_eq!(base.score(floor), base.score(floor));
    }

    #[test]
    fn a_death_outweighs_an_injury() {
        let floor = 0.0;
        assert!(damage(1.0, 0.0, 0.0, 0.0).score(floor) > damage(0.0, 4.0, 0.0, 0.0).score(floor));
    }

    #[test]
    fn ratio_bands() {
        assert_eq!(SeverityBand::from_ratio(0.0), SeverityBand::Low);
        assert_eq!(SeverityBand::from_ratio(0.25), SeverityBand::Medium);
        assert_eq!(SeverityBand::from_ratio(0.5), SeverityBand::High);
        assert_eq!(SeverityBand::from_ratio(0.74), SeverityBand::High);
        assert_eq!(SeverityBand::from_ratio(0.75), SeverityBand::Critical);
    }

    #[test]
    fn flat_range_does_not_divide_by_zero() {
        let range = ScoreRange::from_scores([42.0, 42.0, 42.0]).unwrap();
        assert_eq!(range.ratio(42.0), 0.0);
        let s = style(&Assessment::Scored { score: 42.0 }, Some(range));
        assert_eq!(s.band, SeverityBand::Low);
        assert!(s.radius.is_finite());
        assert!(ScoreRange::from_scores(std::iter::empty::<f64>()).is_none());
    }

    #[test]
    fn unknown_labels_are_neutral() {
        let cat = CategoricalSeverity::from_labels("banana", Some("whenever"));
        assert_eq!(cat.severity, AlertSeverity::Unknown);
        assert_eq!(cat.urgency, Urgency::Unknown);

        let s = style(&assess(&SeverityInput::Categorical(cat), MIN_SEVERITY_SCORE), None);
        assert_eq!(s.band, SeverityBand::Unknown);
        assert_eq!(s.color, "#9ca3af");
        assert_ne!(s.band, SeverityBand::Critical);
    }

    #[test]
    fn categorical_mapping() {
        let cat = CategoricalSeverity::from_labels("EXTREME", Some("Immediate"));
        let s = style(&assess(&SeverityInput::Categorical(cat), MIN_SEVERITY_SCORE), None);
        assert_eq!(s.band, SeverityBand::Critical);
        assert_eq!(s.icon, "flame");
        assert!(s.pulse);
        assert_eq!(s.score, None);

        let cat = CategoricalSeverity::from_labels("Minor", None);
        assert_eq!(cat.severity.ordinal(), Some(1));
        let s = style(&Assessment::Categorical(cat), None);
        assert_eq!(s.band, SeverityBand::Low);
        assert!(!s.pulse);
    }
}
