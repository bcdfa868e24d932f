fn main() -> anyhow::Result<()> {
    svcgen::cli::run_cli()
}
