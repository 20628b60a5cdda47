fn main() {
    // Link against Node symbols only when the addon surface is enabled.
    if std::env::var_os("CARGO_FEATURE_NAPI").is_some() {
        napi_build::setup();
    }
}
