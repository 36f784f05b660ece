//! Mock business-analytics scenarios served to the dashboard exercise.
//!
//! Templates are embedded at compile time and checked once at startup. The
//! raw JSON is what clients receive; the typed digest exists so the exercise
//! runner can turn a scenario into lesson context.

pub mod handlers;

use anyhow::{Context, Result};
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;

const SCENARIOS_JSON: &str = include_str!("../../data/analytics_scenarios.json");

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDigest {
    pub company_name: String,
    pub period: String,
    pub departments: Departments,
    pub key_insights: Vec<String>,
    pub concerns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Departments {
    pub sales: Sales,
    pub marketing: Marketing,
    pub accounting: Accounting,
    pub operations: Operations,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sales {
    pub revenue: String,
    pub growth: String,
    pub top_products: Vec<Product>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub name: String,
    pub sales: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Marketing {
    pub budget: String,
    pub spent: String,
    pub campaigns: Vec<Campaign>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Campaign {
    pub name: String,
    pub roi: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accounting {
    pub revenue: String,
    pub expenses: String,
    pub profit: String,
    pub profit_margin: String,
    pub outstanding_invoices: OutstandingInvoices,
}

/// Older templates carry a preformatted string, newer ones a structured pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OutstandingInvoices {
    Text(String),
    #[serde(rename_all = "camelCase")]
    Detailed { amount: String, avg_days: u32 },
}

impl std::fmt::Display for OutstandingInvoices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutstandingInvoices::Text(text) => f.write_str(text),
            OutstandingInvoices::Detailed { amount, avg_days } => {
                write!(f, "{amount} (avg {avg_days} days)")
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Operations {
    pub productivity: String,
    pub team: Team,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub employees: u32,
    pub satisfaction: String,
}

struct Scenario {
    raw: Value,
    digest: ScenarioDigest,
}

/// The fixed list of scenario templates. Indices exposed to clients are 1-based.
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
}

impl ScenarioCatalog {
    pub fn load() -> Result<Self> {
        Self::from_json(SCENARIOS_JSON)
    }

    fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<Value> =
            serde_json::from_str(json).context("analytics scenarios must be a JSON array")?;
        anyhow::ensure!(!raw.is_empty(), "analytics scenario list is empty");

        let scenarios = raw
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let digest = serde_json::from_value::<ScenarioDigest>(raw.clone())
                    .with_context(|| format!("analytics scenario {} is malformed", i + 1))?;
                Ok(Scenario { raw, digest })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!("Loaded {} analytics scenarios", scenarios.len());
        Ok(Self { scenarios })
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Picks a scenario uniformly at random. Returns its 1-based index and data.
    pub fn pick_random(&self) -> (usize, &Value) {
        let index = rand::thread_rng().gen_range(0..self.scenarios.len());
        (index + 1, &self.scenarios[index].raw)
    }

    pub fn digest(&self, scenario: usize) -> Option<&ScenarioDigest> {
        scenario
            .checked_sub(1)
            .and_then(|i| self.scenarios.get(i))
            .map(|s| &s.digest)
    }
}

impl ScenarioDigest {
    /// Title of the context document attached to the dashboard exercise.
    pub fn document_title(&self) -> String {
        format!(
            "Business Analytics Dashboard - {} ({})",
            self.company_name, self.period
        )
    }

    /// Plain-text dashboard handed to the model as lesson context.
    pub fn dashboard_summary(&self) -> String {
        let Departments {
            sales,
            marketing,
            accounting,
            operations,
        } = &self.departments;

        let top_products = sales
            .top_products
            .iter()
            .map(|p| format!("{} ({})", p.name, p.sales))
            .collect::<Vec<_>>()
            .join(", ");

        let top_campaign = marketing
            .campaigns
            .first()
            .map(|c| format!("{} ({} ROI)", c.name, c.roi))
            .unwrap_or_else(|| "none".to_string());

        format!(
            "SALES: Revenue {} ({}), Top Products: {}\n\n\
             MARKETING: Budget {}, Spent {}, Top Campaign: {}\n\n\
             ACCOUNTING: Revenue {}, Expenses {}, Profit {} ({} margin), Outstanding Invoices: {}\n\n\
             OPERATIONS: Efficiency {}, Team: {} employees ({} satisfaction)\n\n\
             Key Insights: {}\n\n\
             Concerns: {}",
            sales.revenue,
            sales.growth,
            top_products,
            marketing.budget,
            marketing.spent,
            top_campaign,
            accounting.revenue,
            accounting.expenses,
            accounting.profit,
            accounting.profit_margin,
            accounting.outstanding_invoices,
            operations.productivity,
            operations.team.employees,
            operations.team.satisfaction,
            self.key_insights.join("; "),
            self.concerns.join("; "),
        )
    }
}
