//! Cost optimization recommendations
//!
//! A fixed rule set evaluated over an [`AnalysisResult`]. Every rule is
//! independent; the output keeps rule order (high-cost service, multi-region,
//! trend) rather than priority order.

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::report::format_currency;

/// Grand total at or below which the high-cost service rule stays silent
pub const MATERIALITY_FLOOR: f64 = 1.0;

/// Savings assumed for the top service
pub const HIGH_COST_SAVINGS_RATE: f64 = 0.30;

/// Region count above which consolidation is recommended
pub const MULTI_REGION_LIMIT: usize = 2;

/// Recommendation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    CostOptimization,
    Architecture,
    Monitoring,
}

impl RecommendationType {
    /// Human-facing title, e.g. "Cost_Optimization"
    pub fn title(&self) -> String {
        self.to_string()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join("_")
    }
}

impl std::fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecommendationType::CostOptimization => write!(f, "cost_optimization"),
            RecommendationType::Architecture => write!(f, "architecture"),
            RecommendationType::Monitoring => write!(f, "monitoring"),
        }
    }
}

impl std::str::FromStr for RecommendationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cost_optimization" => Ok(RecommendationType::CostOptimization),
            "architecture" => Ok(RecommendationType::Architecture),
            "monitoring" => Ok(RecommendationType::Monitoring),
            _ => Err(format!("Invalid recommendation type: {}", s)),
        }
    }
}

/// Recommendation urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// A single actionable recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    pub priority: Priority,
    /// Service the recommendation is about, when it names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub issue: String,
    pub action: String,
    pub estimated_savings: String,
}

impl Recommendation {
    pub fn new(
        recommendation_type: RecommendationType,
        priority: Priority,
        issue: impl Into<String>,
        action: impl Into<String>,
        estimated_savings: impl Into<String>,
    ) -> Self {
        Self {
            recommendation_type,
            priority,
            service: None,
            issue: issue.into(),
            action: action.into(),
            estimated_savings: estimated_savings.into(),
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }
}

/// Apply every rule to `analysis`, in rule order
pub fn generate(analysis: &AnalysisResult) -> Vec<Recommendation> {
    [high_cost_service, multi_region, cost_trend]
        .iter()
        .filter_map(|rule| rule(analysis))
        .collect()
}

/// Copy of `recommendations` ordered high to low priority, stable within a priority
pub fn sort_by_priority(recommendations: &[Recommendation]) -> Vec<Recommendation> {
    let mut sorted = recommendations.to_vec();
    sorted.sort_by_key(|r| r.priority);
    sorted
}

fn high_cost_service(analysis: &AnalysisResult) -> Option<Recommendation> {
    if analysis.grand_total <= MATERIALITY_FLOOR {
        return None;
    }
    let top = analysis.top_service()?;
    let service = top.key.to_string();
    let savings = top.total * HIGH_COST_SAVINGS_RATE;

    Some(
        Recommendation::new(
            RecommendationType::CostOptimization,
            Priority::High,
            format!(
                "{} accounts for {} of your weekly costs",
                service,
                format_currency(top.total)
            ),
            format!("Review {} usage and consider optimization", service),
            format!("Up to 30% ({}/week)", format_currency(savings)),
        )
        .with_service(service),
    )
}

fn multi_region(analysis: &AnalysisResult) -> Option<Recommendation> {
    let regions = analysis.by_region.non_zero_count();
    if regions <= MULTI_REGION_LIMIT {
        return None;
    }

    Some(Recommendation::new(
        RecommendationType::Architecture,
        Priority::Medium,
        format!("Resources deployed across {} regions", regions),
        "Consolidate resources to fewer regions to reduce data transfer costs",
        "Up to 15% in data transfer costs",
    ))
}

fn cost_trend(analysis: &AnalysisResult) -> Option<Recommendation> {
    let trend = analysis.trend.filter(|t| t.exceeded)?;

    Some(Recommendation::new(
        RecommendationType::Monitoring,
        Priority::High,
        format!(
            "Recent daily cost ({}) is 50% above average ({})",
            format_currency(trend.latest),
            format_currency(trend.average)
        ),
        "Investigate recent changes in resource usage",
        "Prevent cost escalation",
    ))
}
