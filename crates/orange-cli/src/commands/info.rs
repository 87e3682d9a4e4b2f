//! `orange info`: Display version and runtime options.

use super::LoadedConfig;

pub fn execute(config: &LoadedConfig) -> anyhow::Result<()> {
    println!("Orange v{}", env!("CARGO_PKG_VERSION"));
    println!();

    match &config.source {
        Some(path) => println!("Config:       {}", path.display()),
        None => println!("Config:       (defaults)"),
    }
    println!();
    print!("{}", config.options.to_toml()?);

    println!();
    println!("Environment:");
    print_env("  ORANGE_LOG", "ORANGE_LOG");

    Ok(())
}

fn print_env(label: &str, var: &str) {
    match std::env::var(var) {
        Ok(val) => println!("{} = {}", label, val),
        Err(_) => println!("{} = (default)", label),
    }
}
