fn main() -> anyhow::Result<()> {
    marknotes::cli::run()
}
