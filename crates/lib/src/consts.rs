/// File name of the persisted build state, stored inside each backend's build directory.
pub const STATE_FILENAME: &str = ".kiln-state.json";

/// Version of the on-disk build state format. Other versions are discarded.
pub const STATE_VERSION: u32 = 1;

/// Default file name of the build description read by the CLI.
pub const MANIFEST_FILENAME: &str = "kiln.toml";

/// Overrides the number of actions executed in parallel.
pub const ENV_JOBS: &str = "KILN_JOBS";

/// Extra package search roots, in the platform's path-list syntax.
pub const ENV_PACKAGE_PATH: &str = "KILN_PACKAGE_PATH";

/// Log filter directive for the CLI (tracing `EnvFilter` syntax).
pub const ENV_LOG: &str = "KILN_LOG";

/// Separator used when displaying nested namespaces (`engine::render`).
pub const NAMESPACE_SEPARATOR: &str = "::";
