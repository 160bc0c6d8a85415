//! Runtime configuration and layered request config resolution.

mod resolver;
mod workbench_config;

pub use resolver::RequestConfigResolver;
pub use workbench_config::WorkbenchConfig;
