// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn test_login_request() {
    let cli = parse(&["courier", "login", "request", "+48500100200"]).unwrap();
    match cli.command {
        Command::Login(LoginCommand::Request { identifier }) => {
            assert_eq!(identifier, "+48500100200")
        }
        _ => panic!("Expected Login Request command"),
    }
}

#[test]
fn test_login_exchange() {
    let cli = parse(&["courier", "login", "exchange", "abc123"]).unwrap();
    match cli.command {
        Command::Login(LoginCommand::Exchange { token }) => assert_eq!(token, "abc123"),
        _ => panic!("Expected Login Exchange command"),
    }
}

#[test]
fn test_login_requires_subcommand() {
    assert!(parse(&["courier", "login"]).is_err());
}

#[test]
fn test_status_json() {
    let cli = parse(&["courier", "status", "-o", "json"]).unwrap();
    match cli.command {
        Command::Status { output } => assert_eq!(output, OutputFormat::Json),
        _ => panic!("Expected Status command"),
    }
}

#[test]
fn test_logout_and_watch() {
    assert!(matches!(
        parse(&["courier", "logout"]).unwrap().command,
        Command::Logout
    ));
    assert!(matches!(
        parse(&["courier", "watch"]).unwrap().command,
        Command::Watch
    ));
}
