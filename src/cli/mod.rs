use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google")]
    Gemini,
    #[value(alias = "openai")]
    OpenAI,
}

#[derive(Parser, Debug)]
#[command(name = "budgetwise", version, about = "Region-aware monthly budget plans from a generative model")]
pub struct Args {
    /// Region code; runs a single generation instead of the interactive flow
    #[arg(long)]
    pub region: Option<String>,

    /// Index into the region's income brackets (see --list-regions)
    #[arg(long, requires = "region")]
    pub bracket: Option<usize>,

    #[arg(long)]
    pub language: Option<String>,

    /// Print the plan as JSON (one-shot mode)
    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = false)]
    pub list_regions: bool,

    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, default_value_t = false)]
    pub save_request: bool,

    #[arg(long, default_value_t = false)]
    pub save_response: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
