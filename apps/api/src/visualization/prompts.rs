// Prompt constants for the Visualization module.

/// Token budget for the chart configuration call.
pub const CHART_MAX_TOKENS: u32 = 1500;

/// Replace: {sales_data} (pretty-printed JSON), {user_prompt}, {json_only}
pub const CHART_PROMPT_TEMPLATE: &str = r##"You are generating a chart configuration based on a user's prompt.

Sales Data:
{sales_data}

User's prompt: "{user_prompt}"

Generate a chart configuration based on their prompt. If their prompt is vague or missing details, make reasonable assumptions that demonstrate what happens when prompts lack specificity (e.g., use default colors if not specified, generic title if not specified, etc.).

Respond with ONLY valid JSON in this exact format:
{
  "chartType": "bar" | "line" | "area" | "pie",
  "title": "string - chart title",
  "xAxisLabel": "string",
  "yAxisLabel": "string",
  "showValues": boolean,
  "showGrid": boolean,
  "colors": ["#color1", "#color2", ...],
  "showLegend": boolean,
  "interpretation": "1-2 sentences explaining what you created and what assumptions you made due to vague/missing details"
}

Chart types available: bar, line, area, pie
{json_only}"##;
