/// Bundles the plugin through nih_plug_xtask. Usage:
///
///   cargo xtask bundle loveless-delay-v2 --release
///
/// Produces `target/bundled/Loveless Delay.vst3` and `Loveless Delay.clap`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
