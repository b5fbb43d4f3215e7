use cryptopulse_models::MarketData;

pub const ANALYST_SYSTEM_PROMPT: &str = "You are a professional crypto analyst";

/// User prompt asking for the three-part report over `data`.
pub fn analysis_prompt(data: &MarketData) -> Result<String, serde_json::Error> {
    let snapshot = serde_json::to_string(data)?;
    Ok(format!(
        "Generate professional crypto analysis report with:\n\
         1. Market summary\n\
         2. Trading strategy\n\
         3. Price prediction\n\
         Based on: {snapshot}\n"
    ))
}
