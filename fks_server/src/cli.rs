use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Never list FKS_JWT_SECRET, FKS_FLOW_SECRET_KEY or FKS_MAILJET_API_SECRET here
    const DISPLAY_ENVS: [&str; 17] = [
        "RUST_LOG",
        "FKS_HOST",
        "FKS_PORT",
        "FKS_DATABASE_URL",
        "FKS_RUN_MIGRATIONS",
        "FKS_SUCCESS_URL",
        "FKS_PENDING_URL",
        "FKS_ERROR_URL",
        "FKS_FLOW_API_URL",
        "FKS_FLOW_API_KEY",
        "FKS_FLOW_CONFIRMATION_URL",
        "FKS_FLOW_RETURN_URL",
        "FKS_FLOW_SUBJECT",
        "FKS_FLOW_TIMEOUT_SECS",
        "FKS_MAILJET_API_KEY",
        "FKS_MAILJET_SENDER_EMAIL",
        "FKS_MAILJET_SENDER_NAME",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
