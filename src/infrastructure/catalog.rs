use crate::domain::types::StockInfo;

/// Popular symbols offered when no explicit list is given.
const POPULAR_STOCKS: &[(&str, &str)] = &[
    // US tech giants
    ("AAPL", "Apple Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc."),
    ("AMZN", "Amazon.com Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("META", "Meta Platforms Inc."),
    ("TSLA", "Tesla Inc."),
    // US tech
    ("AMD", "Advanced Micro Devices"),
    ("INTC", "Intel Corporation"),
    ("ORCL", "Oracle Corporation"),
    ("IBM", "IBM Corporation"),
    ("CSCO", "Cisco Systems"),
    ("ADBE", "Adobe Inc."),
    ("CRM", "Salesforce Inc."),
    ("QCOM", "Qualcomm Inc."),
    ("TXN", "Texas Instruments"),
    ("AVGO", "Broadcom Inc."),
    ("NOW", "ServiceNow Inc."),
    ("NFLX", "Netflix Inc."),
    ("UBER", "Uber Technologies"),
    // Financials
    ("V", "Visa Inc."),
    ("MA", "Mastercard Inc."),
    ("JPM", "JPMorgan Chase"),
    ("BAC", "Bank of America"),
    ("WFC", "Wells Fargo"),
    ("GS", "Goldman Sachs"),
    ("MS", "Morgan Stanley"),
    ("C", "Citigroup"),
    // Consumer
    ("WMT", "Walmart Inc."),
    ("HD", "Home Depot"),
    ("MCD", "McDonald's Corp"),
    ("NKE", "Nike Inc."),
    ("SBUX", "Starbucks Corp"),
    ("DIS", "Walt Disney Co"),
    // Healthcare
    ("JNJ", "Johnson & Johnson"),
    ("UNH", "UnitedHealth Group"),
    ("PFE", "Pfizer Inc."),
    ("ABBV", "AbbVie Inc."),
    ("TMO", "Thermo Fisher Scientific"),
    ("LLY", "Eli Lilly"),
    // Industrial & energy
    ("XOM", "Exxon Mobil"),
    ("CVX", "Chevron Corp"),
    ("BA", "Boeing Co"),
    ("CAT", "Caterpillar Inc."),
    ("GE", "General Electric"),
    // Telecom & media
    ("T", "AT&T Inc."),
    ("VZ", "Verizon Communications"),
    ("CMCSA", "Comcast Corp"),
];

pub fn get_all_stocks() -> Vec<StockInfo> {
    POPULAR_STOCKS
        .iter()
        .map(|(symbol, name)| StockInfo {
            symbol: symbol.to_string(),
            name: name.to_string(),
        })
        .collect()
}

pub fn company_name(symbol: &str) -> Option<&'static str> {
    let symbol = symbol.to_uppercase();
    POPULAR_STOCKS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, name)| *name)
}
