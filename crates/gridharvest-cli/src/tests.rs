use std::path::Path;

use super::*;

#[test]
fn parses_harvest_command() {
    let cli = Cli::try_parse_from(["gridharvest-cli", "harvest", "pottery-barn"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Harvest {
            ref store,
            output_dir: None,
        } if store == "pottery-barn"
    ));
}

#[test]
fn parses_harvest_output_dir() {
    let cli = Cli::try_parse_from([
        "gridharvest-cli",
        "harvest",
        "williams-sonoma",
        "--output-dir",
        "/tmp/ws",
    ])
    .unwrap();

    assert!(matches!(
        cli.command,
        Commands::Harvest {
            output_dir: Some(ref dir),
            ..
        } if dir == Path::new("/tmp/ws")
    ));
}

#[test]
fn parses_replay_command() {
    let cli = Cli::try_parse_from([
        "gridharvest-cli",
        "replay",
        "pottery-barn",
        "--html",
        "output/pottery-barn_failed_dump.html",
    ])
    .unwrap();

    assert!(matches!(
        cli.command,
        Commands::Replay {
            ref store,
            ref html,
            output_dir: None,
        } if store == "pottery-barn"
            && html == Path::new("output/pottery-barn_failed_dump.html")
    ));
}

#[test]
fn replay_requires_html() {
    assert!(Cli::try_parse_from(["gridharvest-cli", "replay", "pottery-barn"]).is_err());
}

#[test]
fn parses_stores_command() {
    let cli = Cli::try_parse_from(["gridharvest-cli", "stores"]).unwrap();
    assert!(matches!(cli.command, Commands::Stores));
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["gridharvest-cli"]).is_err());
}

#[test]
fn harvest_requires_store() {
    assert!(Cli::try_parse_from(["gridharvest-cli", "harvest"]).is_err());
}
