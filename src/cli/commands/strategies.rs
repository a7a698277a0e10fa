//! List strategies command.

use anyhow::Result;
use atlas_strategies::StrategyRegistry;

pub fn run() -> Result<()> {
    let registry = StrategyRegistry::new();

    println!("Available Strategies");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in registry.list() {
        println!("  {} ", info.name);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        println!("  Averages: {}", info.averages.join(", "));
        println!("  Defaults: {}", serde_json::to_string(&info.default_config)?);
        println!();
    }

    println!("Select one with `strategy = \"<name>\"` in the config file or --strategy.");
    Ok(())
}
