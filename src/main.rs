fn main() -> anyhow::Result<()> {
    formcoach_lib::run()
}
