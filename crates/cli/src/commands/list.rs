//! `switchyard commands` — List registered commands and their documentation.

use switchyard_commands::default_commands;
use switchyard_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let registry =
        default_commands().map_err(|e| format!("Failed to build command registry: {e}"))?;

    let allowed = |name: &str| config.allowed_commands.iter().any(|c| c == name);
    let docs = registry.documentation(&allowed);

    println!("Registered commands");
    println!("===================");
    println!();
    for (operation, docstring) in &docs {
        println!("  {operation}");
        for line in docstring.lines() {
            println!("      {line}");
        }
        let providers = registry.providers_for(operation);
        if providers.len() > 1 {
            println!("      providers: {}", providers.join(", "));
        }
        println!();
    }

    let hidden = registry.operations().len() - docs.len();
    if hidden > 0 {
        println!("  ({hidden} more not in allowed_commands)");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use switchyard_commands::default_commands;

    #[test]
    fn builtins_are_documented() {
        let registry = default_commands().unwrap();
        let docs = registry.documentation(&|_| true);
        assert!(docs.iter().any(|(op, _)| op == "say"));
        assert!(docs.iter().all(|(_, doc)| !doc.trim().is_empty()));
    }
}
