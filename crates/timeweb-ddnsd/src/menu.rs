//! Interactive main menu and manual record editor

use anyhow::Result;
use std::io::{BufRead, Write};
use std::net::Ipv4Addr;

use timeweb_ddns_core::{
    DataPaths, DdnsConfig, DdnsEngine, RecordSynchronizer, RecordValue, SessionManager,
    UpdateOutcome,
};
use timeweb_ddns_webdriver::WebDriverLauncher;

use crate::console::Console;
use crate::setup;

/// Top-level menu; returns when the user exits or input ends
pub async fn main_menu<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    engine: &mut DdnsEngine,
    paths: &DataPaths,
) -> Result<()> {
    loop {
        console.say("")?;
        console.say("--- Timeweb DDNS ---")?;
        console.say("1. Check and update IP")?;
        console.say("2. Force update (even if the IP did not change)")?;
        console.say("3. View / edit A-records manually")?;
        console.say("4. Settings")?;
        console.say("5. Reset session (log in again next time)")?;
        console.say("6. Exit")?;

        let Some(choice) = console.ask("Choose an action: ")? else {
            return Ok(());
        };

        match choice.as_str() {
            "1" => report_update(console, engine.run_update(false).await)?,
            "2" => report_update(console, engine.run_update(true).await)?,
            "3" => manual_edit(console, engine).await?,
            "4" => {
                // Edit what is on disk so environment overrides never get persisted
                let mut file_config = match DdnsConfig::load(&paths.config_file()) {
                    Ok(config) => config,
                    Err(e) => {
                        console.say(format!("Could not read the settings: {}", e))?;
                        continue;
                    }
                };
                setup::edit_settings(console, &mut file_config, &paths.config_file())?;
                let applied =
                    apply_settings(engine, file_config, |key| std::env::var(key).ok());
                if let Err(e) = applied {
                    console.say(format!("Settings not applied: {}", e))?;
                }
            }
            "5" => match engine.reset_session().await {
                Ok(()) => console.say("Session reset. The next run logs in from scratch.")?,
                Err(e) => console.say(format!("Could not reset the session: {}", e))?,
            },
            "6" => {
                console.say("Bye.")?;
                return Ok(());
            }
            _ => console.say("Invalid choice, pick a menu item.")?,
        }
    }
}

/// Hand edited settings to the engine, re-applying environment overrides
///
/// The launcher is rebuilt so a browser change takes effect on the next run.
fn apply_settings<F>(
    engine: &mut DdnsEngine,
    mut config: DdnsConfig,
    lookup: F,
) -> timeweb_ddns_core::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    config.apply_overrides_from(lookup);
    let launcher = WebDriverLauncher::from_config(&config);
    engine.set_config(config)?;
    engine.set_launcher(Box::new(launcher));
    Ok(())
}

fn report_update<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    result: timeweb_ddns_core::Result<UpdateOutcome>,
) -> Result<()> {
    let line = match result {
        Ok(UpdateOutcome::Updated { ip, .. }) => {
            format!("DNS records updated, saved IP is now {}.", ip)
        }
        Ok(UpdateOutcome::Unchanged { ip }) => format!("IP {} unchanged, nothing to do.", ip),
        Ok(UpdateOutcome::IpUnavailable) => {
            "Could not determine the current IP. Nothing was changed.".to_string()
        }
        Ok(UpdateOutcome::SyncFailed { report, .. }) => format!(
            "Update failed for: {}. The saved IP was not changed.",
            report.failed().join(", ")
        ),
        Ok(UpdateOutcome::AuthenticationFailed { reason }) => {
            format!("Could not log in to the panel: {}", reason)
        }
        Err(e) => format!("Update failed: {}", e),
    };
    console.say(line)?;
    Ok(())
}

/// Browse and edit records over one authenticated session
async fn manual_edit<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    engine: &DdnsEngine,
) -> Result<()> {
    console.say("Connecting to the panel (this can take a minute)...")?;
    let mut session = match engine.open_session().await {
        Ok(session) => session,
        Err(e) => {
            console.say(format!("Could not log in: {}", e))?;
            return Ok(());
        }
    };

    let result = edit_records(console, &mut session, &engine.config().domains).await;

    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close the browser: {}", e);
    }
    result
}

async fn edit_records<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    session: &mut SessionManager,
    domains: &[String],
) -> Result<()> {
    let mut records = RecordSynchronizer::new(session).read_all(domains).await?;

    loop {
        console.say("")?;
        console.say("--- Current A-records (live session) ---")?;
        for (i, (domain, value)) in records.iter().enumerate() {
            console.say(format!("{}. {} -> {}", i + 1, domain, value))?;
        }
        console.say("0. Back to main menu (closes the session)")?;

        let Some(choice) = console.ask("Pick a domain to edit: ")? else {
            return Ok(());
        };
        let Ok(index) = choice.parse::<usize>() else {
            console.say("Please enter a number.")?;
            continue;
        };
        if index == 0 {
            return Ok(());
        }
        if index > records.len() {
            console.say("No such entry, pick one from the list.")?;
            continue;
        }

        let domain = records[index - 1].0.clone();
        let Some(raw_ip) = console.ask(&format!("New IP for '{}': ", domain))? else {
            return Ok(());
        };
        let ip = match raw_ip.parse::<Ipv4Addr>() {
            Ok(ip) => ip,
            Err(_) if raw_ip.is_empty() => {
                console.say("The IP address cannot be empty. Cancelled.")?;
                continue;
            }
            Err(_) => {
                console.say(format!("'{}' is not an IPv4 address. Cancelled.", raw_ip))?;
                continue;
            }
        };

        console.say(format!("Updating {} to {}...", domain, ip))?;
        if RecordSynchronizer::new(session).sync_record(&domain, ip).await? {
            console.say(format!("Record for {} updated.", domain))?;
            records[index - 1].1 = RecordValue::Found(ip.to_string());
        } else {
            console.say(format!("Could not update the record for {}.", domain))?;
        }

        console.ask("Press Enter to continue...")?;
    }
}
