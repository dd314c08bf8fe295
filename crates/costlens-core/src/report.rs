//! Report formatting
//!
//! Reports are built as structured values ([`Report`], [`ReportSection`],
//! [`ReportItem`]) and turned into text separately by [`Report::render`].

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::ranking::{rank, RankedEntry};
use crate::recommendation::Recommendation;
use crate::threshold::ThresholdEvaluation;

/// Recommendations shown in a report, the rest are left out
pub const REPORT_RECOMMENDATION_LIMIT: usize = 3;

/// Services listed in a report breakdown
pub const REPORT_SERVICE_LIMIT: usize = 5;

/// Render an amount as `$x.xx`
pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// A report ready to be rendered or published
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    /// One-line summary used as the notification subject
    pub subject: String,
    pub sections: Vec<ReportSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub heading: Option<String>,
    pub items: Vec<ReportItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportItem {
    Field {
        label: String,
        value: String,
    },
    Entry {
        name: String,
        amount: f64,
        percentage: Option<f64>,
    },
    Recommendation {
        index: usize,
        recommendation: Recommendation,
    },
}

impl ReportSection {
    fn new(heading: Option<&str>) -> Self {
        Self {
            heading: heading.map(str::to_string),
            items: Vec::new(),
        }
    }

    fn field(mut self, label: &str, value: String) -> Self {
        self.items.push(ReportItem::Field {
            label: label.to_string(),
            value,
        });
        self
    }
}

impl ReportItem {
    fn render(&self) -> String {
        match self {
            ReportItem::Field { label, value } => format!("{}: {}\n", label, value),
            ReportItem::Entry {
                name,
                amount,
                percentage: Some(percentage),
            } => format!("• {}: {} ({:.1}%)\n", name, format_currency(*amount), percentage),
            ReportItem::Entry {
                name,
                amount,
                percentage: None,
            } => format!("• {}: {}\n", name, format_currency(*amount)),
            ReportItem::Recommendation {
                index,
                recommendation,
            } => format!(
                "{}. [{}] {}\n   Issue: {}\n   Action: {}\n   Savings: {}\n\n",
                index,
                recommendation.priority.to_string().to_uppercase(),
                recommendation.recommendation_type.title(),
                recommendation.issue,
                recommendation.action,
                recommendation.estimated_savings
            ),
        }
    }
}

impl Report {
    /// Plain-text rendering of the report
    pub fn render(&self) -> String {
        let mut out = format!("{}\n\n", self.title);
        for section in &self.sections {
            if let Some(heading) = &section.heading {
                out.push_str(heading);
                out.push_str(":\n");
                if matches!(section.items.first(), Some(ReportItem::Recommendation { .. })) {
                    out.push('\n');
                }
            }
            for item in &section.items {
                out.push_str(&item.render());
            }
            if !matches!(section.items.last(), Some(ReportItem::Recommendation { .. })) {
                out.push('\n');
            }
        }
        out.truncate(out.trim_end().len());
        out.push('\n');
        out
    }

    pub fn section(&self, heading: &str) -> Option<&ReportSection> {
        self.sections
            .iter()
            .find(|s| s.heading.as_deref() == Some(heading))
    }
}

/// Weekly analysis summary with at most [`REPORT_RECOMMENDATION_LIMIT`] recommendations
pub fn format_analysis(analysis: &AnalysisResult, recommendations: &[Recommendation]) -> Report {
    let (top_service, top_service_cost) = top_or_none(analysis.top_service());
    let (top_region, top_region_cost) = top_or_none(analysis.top_region());

    let mut sections = vec![ReportSection::new(None)
        .field("💰 Total Weekly Cost", format_currency(analysis.grand_total))
        .field(
            "📈 Top Service",
            format!("{} ({})", top_service, format_currency(top_service_cost)),
        )
        .field(
            "🌍 Top Region",
            format!("{} ({})", top_region, format_currency(top_region_cost)),
        )];

    if !recommendations.is_empty() {
        let mut section = ReportSection::new(Some("🎯 Optimization Recommendations"));
        section.items = recommendations
            .iter()
            .take(REPORT_RECOMMENDATION_LIMIT)
            .enumerate()
            .map(|(i, recommendation)| ReportItem::Recommendation {
                index: i + 1,
                recommendation: recommendation.clone(),
            })
            .collect();
        sections.push(section);
    }

    let mut breakdown = ReportSection::new(Some("📋 Service Breakdown"));
    breakdown.items = entries(
        &rank(&analysis.by_service, analysis.grand_total, REPORT_SERVICE_LIMIT),
        true,
    );
    sections.push(breakdown);

    Report {
        title: "📊 Weekly Cost Analysis Report".to_string(),
        subject: format!("Weekly Cost Analysis: {}", format_currency(analysis.grand_total)),
        sections,
    }
}

/// Daily alert sent when a total crosses its ceiling
pub fn format_threshold_alert(evaluation: &ThresholdEvaluation, analysis: &AnalysisResult) -> Report {
    let summary = ReportSection::new(None)
        .field("Yesterday's total", format_currency(evaluation.total))
        .field("Threshold", format_currency(evaluation.threshold));

    let mut services = ReportSection::new(Some("Top services"));
    services.items = entries(
        &rank(&analysis.by_service, analysis.grand_total, REPORT_SERVICE_LIMIT),
        false,
    );

    Report {
        title: "⚠️ Cost Alert!".to_string(),
        subject: format!("Cost Alert: {}", format_currency(evaluation.total)),
        sections: vec![summary, services],
    }
}

fn top_or_none(top: Option<&crate::aggregation::Aggregate>) -> (String, f64) {
    top.map(|a| (a.key.to_string(), a.total))
        .unwrap_or_else(|| ("None".to_string(), 0.0))
}

fn entries(ranking: &[RankedEntry], with_percentage: bool) -> Vec<ReportItem> {
    ranking
        .iter()
        .map(|entry| ReportItem::Entry {
            name: entry.key.to_string(),
            amount: entry.total,
            percentage: with_percentage.then_some(entry.percentage),
        })
        .collect()
}
