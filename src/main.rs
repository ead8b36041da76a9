//! otelui CLI entry point.

use otelui_lib::cli::{self, Cli};
use otelui_lib::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli::execute(cli).await
}
