use mn_domain::config::Config;

/// Parse and validate the config, printing the outcome.
///
/// Returns `true` when valid.
pub fn validate(config: &Config, config_path: &str) -> bool {
    match config.validate() {
        Ok(()) => {
            println!("Config OK ({config_path})");
            true
        }
        Err(e) => {
            println!("{e}");
            println!("\n1 error in {config_path}");
            false
        }
    }
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) {
    match toml::to_string_pretty(config) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Failed to serialize config: {e}");
            std::process::exit(1);
        }
    }
}
