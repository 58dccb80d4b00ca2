//! Initial setup and the settings menu
//!
//! Both write `config.json` as soon as something changes, so an interrupted
//! session never loses the answers already given.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;

use timeweb_ddns_core::config::{parse_domain_list, validate_domain_name};
use timeweb_ddns_core::{BrowserKind, DdnsConfig, Secret};

use crate::console::Console;

fn ask_domains<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    prompt: &str,
) -> Result<Option<Vec<String>>> {
    let Some(raw) = console.ask(prompt)? else {
        return Ok(None);
    };
    let domains = parse_domain_list(&raw);
    for domain in &domains {
        if let Err(e) = validate_domain_name(domain) {
            console.say(format!("Invalid domain: {}", e))?;
            return Ok(None);
        }
    }
    Ok(Some(domains))
}

fn ask_browser<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    current: BrowserKind,
) -> Result<Option<BrowserKind>> {
    let prompt = format!("Browser to use (chrome/firefox) [{}]: ", current);
    let Some(raw) = console.ask(&prompt)? else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(Some(current));
    }
    match raw.parse::<BrowserKind>() {
        Ok(browser) => Ok(Some(browser)),
        Err(_) => {
            console.say(format!("Unknown browser '{}', keeping {}", raw, current))?;
            Ok(Some(current))
        }
    }
}

/// First-run questionnaire: login, password, domains, browser
pub fn initial_setup<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    mut config: DdnsConfig,
    path: &Path,
) -> Result<DdnsConfig> {
    console.say("--- Initial setup ---")?;
    console.say("Panel credentials are not configured yet.")?;

    let login = console.ask("Timeweb login: ")?.unwrap_or_default();
    let password = console.ask_secret("Timeweb password: ")?.unwrap_or_default();
    if login.is_empty() || password.is_empty() {
        anyhow::bail!(timeweb_ddns_core::Error::config_missing(
            "login and password are required"
        ));
    }
    config.timeweb_login = login;
    config.timeweb_password = Secret::new(password);

    if let Some(domains) = ask_domains(
        console,
        "Domains and subdomains, comma-separated (e.g. example.com,api.example.com): ",
    )? {
        config.domains = domains;
    }

    if let Some(browser) = ask_browser(console, config.browser)? {
        config.browser = browser;
    }

    config.save(path)?;
    console.say(format!("Settings saved to {}", path.display()))?;
    Ok(config)
}

/// Interactive settings editor; returns once the user goes back
pub fn edit_settings<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    config: &mut DdnsConfig,
    path: &Path,
) -> Result<()> {
    loop {
        console.say("")?;
        console.say("--- Settings ---")?;
        console.say(format!("1. Login: {}", config.timeweb_login))?;
        console.say("2. Password: ********")?;
        console.say(format!("3. Domains: {}", config.domains.join(", ")))?;
        console.say(format!("4. Browser: {}", config.browser))?;
        console.say(format!(
            "5. Check interval (minutes): {}",
            config.check_interval_minutes
        ))?;
        console.say("6. Back")?;

        let Some(choice) = console.ask("Choose a setting to change: ")? else {
            return Ok(());
        };

        let changed = match choice.as_str() {
            "1" => match console.ask("New login: ")? {
                Some(login) if !login.is_empty() => {
                    config.timeweb_login = login;
                    true
                }
                _ => false,
            },
            "2" => match console.ask_secret("New password: ")? {
                Some(password) if !password.is_empty() => {
                    config.timeweb_password = Secret::new(password);
                    true
                }
                _ => false,
            },
            "3" => match ask_domains(console, "New comma-separated domain list: ")? {
                Some(domains) => {
                    config.domains = domains;
                    true
                }
                None => false,
            },
            "4" => match ask_browser(console, config.browser)? {
                Some(browser) if browser != config.browser => {
                    config.browser = browser;
                    true
                }
                _ => false,
            },
            "5" => {
                let raw = console.ask("New check interval in minutes: ")?;
                match raw.as_deref().map(str::parse::<u64>) {
                    Some(Ok(minutes)) if minutes > 0 => {
                        config.check_interval_minutes = minutes;
                        true
                    }
                    _ => {
                        console.say("The interval must be a whole number greater than 0.")?;
                        false
                    }
                }
            }
            "6" => return Ok(()),
            _ => {
                console.say("Invalid choice.")?;
                false
            }
        };

        if changed {
            config.save(path)?;
            console.say("Saved.")?;
        }
    }
}
