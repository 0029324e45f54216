pub mod app;
pub mod browser;
pub mod ui;

use std::error::Error;
use std::path::Path;
use wavetty::config::Config;

pub fn run(config: &Config, path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    app::run(config, path)
}
