use clap::Parser;
use pvesh::{Client, Pvesh};

use proxmox::cli::{Cli, Command};
use proxmox::handlers::{
    reconcile, AcmeAccountHandler, AcmePluginHandler, ClusterOptionsHandler, HaGroupHandler,
    HaResourceHandler, PoolHandler, QemuHandler, Report,
};

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let client = Pvesh::new().with_command(cli.pvesh_command.clone());
    match run(&cli, &client) {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(err) => fail(&err),
        },
        Err(err) => fail(&err),
    }
}

fn fail(err: &dyn std::fmt::Display) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1);
}

fn run(cli: &Cli, client: &impl Client) -> Result<Report, proxmox::Error> {
    let check = cli.check;
    match &cli.command {
        Command::Pool(args) => {
            let handler = PoolHandler::new(client, args.resource());
            reconcile(&handler, args.state.into(), check)
        }
        Command::ClusterOptions(args) => {
            ClusterOptionsHandler::new(client, args.resource()).reconcile(check)
        }
        Command::HaGroup(args) => {
            let handler = HaGroupHandler::new(client, args.resource());
            reconcile(&handler, args.state.into(), check)
        }
        Command::HaResource(args) => {
            let handler = HaResourceHandler::new(client, args.resource());
            reconcile(&handler, args.state.into(), check)
        }
        Command::AcmeAccount(args) => {
            let handler = AcmeAccountHandler::new(client, args.resource());
            reconcile(&handler, args.state.into(), check)
        }
        Command::AcmePlugin(args) => {
            let handler = AcmePluginHandler::new(client, args.resource());
            reconcile(&handler, args.state.into(), check)
        }
        Command::Qemu(args) => {
            let handler = QemuHandler::new(client, args.resource()?);
            reconcile(&handler, args.state.into(), check)
        }
    }
}
