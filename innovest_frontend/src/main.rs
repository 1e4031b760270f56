use anyhow::Result;

fn main() -> Result<()> {
    innovest_frontend::run()
}
