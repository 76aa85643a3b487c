//! `pocketclaw providers`: List supported LLM providers.

use pocketclaw_config::ENV_KEYS;
use pocketclaw_providers::PROVIDERS;

pub fn run() {
    println!("Supported LLM Providers");
    println!("=======================");
    println!();
    println!("  {:<12} {:<7} {:<8} Base URL", "Provider", "Wire", "Auth");
    for spec in PROVIDERS {
        let auth = if spec.needs_key { "API key" } else { "none" };
        println!(
            "  {:<12} {:<7} {:<8} {}",
            spec.name, spec.family, auth, spec.base_url
        );
    }
    println!();
    println!("  Any OpenAI-compatible endpoint works via llm.base_url.");
    println!();
    println!("  Environment variables:");
    println!("    POCKETCLAW_API_KEY, POCKETCLAW_PROVIDER, POCKETCLAW_MODEL");
    let vendor: Vec<&str> = ENV_KEYS.iter().map(|(var, _, _)| *var).collect();
    println!("    {}", vendor.join(", "));
}
