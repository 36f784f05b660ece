use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Area,
    Pie,
}

/// Chart configuration returned by the visualization call. Lives only for
/// one exercise attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
    pub show_values: bool,
    pub show_grid: bool,
    pub colors: Vec<String>,
    pub show_legend: bool,
    pub interpretation: String,
}

impl ChartSpec {
    pub fn fallback() -> Self {
        Self {
            chart_type: ChartType::Bar,
            title: "Sales Data".to_string(),
            x_axis_label: "Quarter".to_string(),
            y_axis_label: "Sales".to_string(),
            show_values: false,
            show_grid: true,
            colors: vec!["#10B981".to_string()],
            show_legend: false,
            interpretation: "Error generating chart. Using default configuration.".to_string(),
        }
    }
}

/// One row of the tabular dataset charted in the visualization exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub quarter: String,
    pub sales: u64,
    pub label: String,
}

/// The fixed dataset used when a request does not bring its own.
pub fn quarterly_sales_2024() -> Vec<SalesRecord> {
    [
        ("Q1 2024", 45_000, "Q1"),
        ("Q2 2024", 62_000, "Q2"),
        ("Q3 2024", 58_000, "Q3"),
        ("Q4 2024", 71_000, "Q4"),
    ]
    .into_iter()
    .map(|(quarter, sales, label)| SalesRecord {
        quarter: quarter.to_string(),
        sales,
        label: label.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_type_rejects_unknown() {
        assert!(serde_json::from_str::<ChartType>(r#""scatter""#).is_err());
        assert_eq!(
            serde_json::from_str::<ChartType>(r#""area""#).unwrap(),
            ChartType::Area
        );
    }

    #[test]
    fn test_fallback_is_bar_with_single_color() {
        let spec = ChartSpec::fallback();
        assert_eq!(spec.chart_type, ChartType::Bar);
        assert_eq!(spec.colors, vec!["#10B981".to_string()]);
        assert!(spec.show_grid);
    }

    #[test]
    fn test_default_dataset_has_four_quarters() {
        let data = quarterly_sales_2024();
        assert_eq!(data.len(), 4);
        assert_eq!(data[3].sales, 71_000);
        assert_eq!(data[0].label, "Q1");
    }
}
