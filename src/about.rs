pub const BANDWAGON_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BANDWAGON_BUILD_N: &str = env!("BANDWAGON_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "BandWagon {}\nBuild {}\nRestriction digestion band prediction",
        BANDWAGON_VERSION, BANDWAGON_BUILD_N
    )
}
