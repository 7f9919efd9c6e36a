pub mod config;
pub mod fs_util;
pub mod generator;
pub mod i18n;
pub mod renderer;
pub mod static_dir;
pub mod url_filter;

pub use config::Config;
pub use generator::{BuildOptions, BuildReport, Generator};

pub fn build(config: Config, options: BuildOptions) -> anyhow::Result<BuildReport> {
    let generator = Generator::new(config, options)?;
    generator.build()
}
