//! Status command handler.
//!
//! Probes the coordinator and prints the model pool and studio settings.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::print_separator;

pub async fn execute(ctx: &CliContext) -> Result<()> {
    let coordinator = ctx.coordinator();
    println!("Coordinator: {}", coordinator.label());
    match coordinator.status().await {
        Ok(status) => println!("  status: {status}"),
        Err(err) => println!("  unreachable: {err}"),
    }

    let status = ctx.dispatcher().status();
    println!("\n{:<10} {:<20} {:<8} Utilization", "Kind", "Model", "Load");
    print_separator(52);
    for model in &status.models {
        println!(
            "{:<10} {:<20} {:<8} {}%",
            model.kind.as_str(),
            model.id,
            model.load,
            model.utilization
        );
    }
    for (kind, waiting) in &status.queued {
        if *waiting > 0 {
            println!("{waiting} {kind} task(s) waiting");
        }
    }

    let settings = &ctx.settings;
    println!(
        "\nStudio: {} line(s) per anchor, {} tone, {} by default, up to {} queued preparation(s)",
        settings.lines_per_anchor,
        settings.tone,
        settings.default_visibility,
        settings.max_parallel_prep
    );
    Ok(())
}
