use clap::Parser;
use defscope_cli::Cli;
use defscope_cli::init_tracing;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.run()
}
