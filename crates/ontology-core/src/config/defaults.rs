//! Default values for ontology extraction.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Scan Defaults
// ============================================================================

/// Files larger than this are skipped (2 MB). Mostly bundled or generated code.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Directories never scanned.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    // Version control
    ".git",
    ".svn",
    ".hg",
    // Dependencies
    "node_modules",
    "vendor",
    "venv",
    ".venv",
    "__pycache__",
    // Build outputs
    "build",
    "dist",
    "bin",
    "obj",
    "target",
    "out",
    // Test data
    "testdata",
    "test-data",
    "test_data",
    "__fixtures__",
    // Tooling
    ".sfdx",
    ".next",
    "coverage",
];

/// File name globs for generated or bundled code.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "*.pb.go",
    "*_generated.go",
    "*.gen.go",
    "*_mock.go",
    "*.g.cs",
    "*.g.i.cs",
    "*.designer.cs",
    "*.Designer.cs",
    "*.AssemblyInfo.cs",
    "*.min.js",
    "*.bundle.js",
    "*.d.ts",
    "*_pb2.py",
    "*_pb2_grpc.py",
];

// ============================================================================
// Parallel Defaults
// ============================================================================

/// Whether the worker pool is used at all.
pub const DEFAULT_PARALLEL_ENABLED: bool = true;

/// Minimum number of files in one language before the worker pool kicks in.
pub const DEFAULT_MIN_PARALLEL_FILES: usize = 200;

/// Log a progress line every this many files in the sequential loop.
pub const PROGRESS_INTERVAL: usize = 100;

// ============================================================================
// Config File Locations
// ============================================================================

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = "ontology.toml";

/// Directory under the user config dir.
pub const USER_CONFIG_DIR: &str = "ontology";

/// File name inside [`USER_CONFIG_DIR`].
pub const USER_CONFIG_FILE: &str = "config.toml";
