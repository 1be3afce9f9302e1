use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "tradepost", about = "Authentication service for the tradepost dashboard")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
}
