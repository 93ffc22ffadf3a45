fn main() -> anyhow::Result<()> {
    autowalk_lib::run()
}
