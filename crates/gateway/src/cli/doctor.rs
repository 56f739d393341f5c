use mn_backend::RestPlatformClient;
use mn_domain::config::Config;

/// Run all diagnostic checks and print a summary.
///
/// Returns `Ok(true)` when every check passes, `Ok(false)` when at least
/// one check failed.
pub async fn run(config: &Config, config_path: &str) -> anyhow::Result<bool> {
    println!("mentora doctor");
    println!("==============\n");

    let mut all_passed = true;

    // 1. Config file
    check_config_file(config_path, &mut all_passed);

    // 2. Config validation
    check_config_validation(config, &mut all_passed);

    // 3. Backend platform connectivity
    check_backend(config, &mut all_passed).await;

    // 4. Completion provider
    check_provider(config, &mut all_passed);

    // Summary
    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

// ── Individual checks ─────────────────────────────────────────────────

fn check_config_file(config_path: &str, all_passed: &mut bool) {
    let exists = std::path::Path::new(config_path).exists();
    print_check(
        "Config file exists",
        exists,
        if exists {
            config_path.to_owned()
        } else {
            format!("{config_path} not found (using defaults)")
        },
    );
    if !exists {
        *all_passed = false;
    }
}

fn check_config_validation(config: &Config, all_passed: &mut bool) {
    match config.validate() {
        Ok(()) => print_check("Config validation", true, "no issues".into()),
        Err(e) => {
            print_check("Config validation", false, e.to_string());
            *all_passed = false;
        }
    }
}

async fn check_backend(config: &Config, all_passed: &mut bool) {
    let client = match RestPlatformClient::new(&config.backend) {
        Ok(c) => c,
        Err(e) => {
            print_check("Backend client", false, e.to_string());
            *all_passed = false;
            return;
        }
    };
    match client.health().await {
        Ok(()) => print_check("Backend reachable", true, config.backend.base_url.clone()),
        Err(e) => {
            print_check("Backend reachable", false, e.to_string());
            *all_passed = false;
        }
    }
}

fn check_provider(config: &Config, all_passed: &mut bool) {
    match mn_providers::build_provider(&config.llm) {
        Ok(provider) => print_check(
            "Completion provider",
            true,
            format!("{} ({})", provider.provider_id(), config.llm.model),
        ),
        Err(e) => {
            print_check("Completion provider", false, e.to_string());
            *all_passed = false;
        }
    }
}

fn print_check(name: &str, passed: bool, detail: String) {
    let mark = if passed { "ok" } else { "FAIL" };
    println!("  [{mark:>4}] {name:<24} {detail}");
}
