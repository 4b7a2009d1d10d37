fn main() -> anyhow::Result<()> {
    mannequin::app::run()
}
