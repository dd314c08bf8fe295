//! Historical storage schema
//!
//! The shape an analysis takes when handed to an external document store.
//! Amounts are exact decimals here, independent of the `f64` arithmetic used
//! while analyzing. Each document is keyed by the analysis timestamp.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregation::{Aggregate, AggregateMap};
use crate::analysis::AnalysisResult;
use crate::recommendation::Recommendation;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    /// ISO-8601 analysis timestamp
    pub id: String,
    pub total_cost: Decimal,
    pub service_costs: BTreeMap<String, Decimal>,
    pub regional_costs: BTreeMap<String, Decimal>,
    pub daily_costs: BTreeMap<String, Decimal>,
    pub top_service: Option<StoredCost>,
    pub top_region: Option<StoredCost>,
    pub trend: Option<StoredTrend>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCost {
    pub name: String,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTrend {
    pub average: Decimal,
    pub latest: Decimal,
    pub ratio: Decimal,
    pub exceeded: bool,
}

impl StoredAnalysis {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl TryFrom<&AnalysisResult> for StoredAnalysis {
    type Error = Error;

    fn try_from(analysis: &AnalysisResult) -> Result<Self> {
        let trend = match &analysis.trend {
            Some(trend) => Some(StoredTrend {
                average: to_decimal(trend.average)?,
                latest: to_decimal(trend.latest)?,
                ratio: to_decimal(trend.ratio)?,
                exceeded: trend.exceeded,
            }),
            None => None,
        };

        Ok(Self {
            id: analysis.id(),
            total_cost: to_decimal(analysis.grand_total)?,
            service_costs: to_decimal_map(&analysis.by_service)?,
            regional_costs: to_decimal_map(&analysis.by_region)?,
            daily_costs: to_decimal_map(&analysis.by_day)?,
            top_service: analysis.top_service().map(stored_cost).transpose()?,
            top_region: analysis.top_region().map(stored_cost).transpose()?,
            trend,
            recommendations: analysis.recommendations.clone(),
        })
    }
}

/// Exact decimal form of `value` as it prints, e.g. `0.1` stays `0.1`
pub fn to_decimal(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(Error::Serialization(format!(
            "cannot store non-finite amount {}",
            value
        )));
    }
    Ok(value.to_string().parse::<Decimal>()?)
}

fn to_decimal_map(aggregates: &AggregateMap) -> Result<BTreeMap<String, Decimal>> {
    aggregates
        .iter()
        .map(|a| Ok((a.key.to_string(), to_decimal(a.total)?)))
        .collect()
}

fn stored_cost(aggregate: &Aggregate) -> Result<StoredCost> {
    Ok(StoredCost {
        name: aggregate.key.to_string(),
        cost: to_decimal(aggregate.total)?,
    })
}
