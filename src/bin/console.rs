use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use hms_access::auth::Requirement;
use hms_access::config::AccessConfig;
use hms_access::core::{AuthStore, SessionMonitor};

const HELP: &str = "commands: login <id> <password> | logout | refresh | extend | status | \
                    can <route> | perm <resource> <action> | users | help | quit";

#[tokio::main]
async fn main() {
    // Load .env before the logger reads RUST_LOG
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    match dotenv {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    let config = match AccessConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: timeout={}m, warning={}m, refresh={}m, poll={:?}",
        config.session_timeout_minutes,
        config.session_warning_minutes,
        config.session_refresh_minutes,
        config.poll_interval
    );

    let poll_interval = config.poll_interval;
    let store = Arc::new(AuthStore::builder(config).build());
    let monitor = SessionMonitor::new(Arc::clone(&store), poll_interval);

    if store.is_authenticated() {
        monitor.start();
    }

    // Print banner changes as they happen
    let mut banner = monitor.subscribe();
    tokio::spawn(async move {
        while banner.changed().await.is_ok() {
            let state = *banner.borrow_and_update();
            if state.visible {
                println!(
                    "!! Session expires in {} minute(s). Type 'extend' to stay signed in.",
                    state.minutes_remaining
                );
            }
        }
    });

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        };

        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => {}
            ["login", id, password] => {
                if store.login(id, password).await {
                    monitor.start();
                    print_status(&store);
                } else {
                    println!("Invalid credentials");
                }
            }
            ["logout"] => {
                monitor.logout_now();
                monitor.stop();
                println!("Signed out");
            }
            ["refresh"] => {
                store.refresh_session();
                print_status(&store);
            }
            ["extend"] => {
                monitor.extend();
                print_status(&store);
            }
            ["status"] => {
                // A lapsed session should read as signed out right away
                if store.check_session() {
                    monitor.stop();
                }
                print_status(&store);
            }
            ["can", route] => print_decision(&store, &Requirement::route(route)),
            ["perm", resource, action] => {
                print_decision(&store, &Requirement::permission(resource, action))
            }
            ["users"] => {
                for identity in store.known_identities() {
                    println!(
                        "{:<32} {:<14} {}{}",
                        identity.email,
                        identity.role.as_str(),
                        identity.display_name,
                        if identity.is_active { "" } else { " (inactive)" }
                    );
                }
            }
            ["help"] => println!("{}", HELP),
            ["quit"] | ["exit"] => break,
            _ => println!("Unrecognized command. {}", HELP),
        }
    }

    monitor.stop();
}

fn print_status(store: &AuthStore) {
    match (store.current_identity(), store.remaining_session_minutes()) {
        (Some(identity), Some(minutes)) => println!(
            "Signed in as {} ({}), {} minute(s) remaining",
            identity.display_name, identity.role, minutes
        ),
        _ => println!("Not signed in"),
    }
}

fn print_decision(store: &AuthStore, requirement: &Requirement) {
    match store.authorize(requirement).reason() {
        None => println!("allowed"),
        Some(reason) => println!("denied ({}): {}", reason.code(), reason),
    }
}
