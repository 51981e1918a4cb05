mod apply;
mod config;
mod error;
mod exif_reader;
mod existence;
mod extension;
mod letters;
mod metadata;
mod planner;
mod scanner;

pub use apply::{
    apply_plan, execute_plan, report_plan, ApplyResult, ExecuteMode, ExecuteOutcome,
    RenameFailure,
};
pub use config::{app_paths, load_config, load_config_from, AppPaths, RenameConfig};
pub use error::RenameError;
pub use exif_reader::{read_exif_tags, ExifMetadataReader};
pub use existence::{ExistenceOracle, Lookup};
pub use extension::{parse_enforced_extension, ExtensionError, ExtensionKind};
pub use letters::{decode_letters, encode_letters};
pub use metadata::{format_name_base, parse_capture_time, MetadataReader, TagMap};
pub use planner::{
    build_plan, plan_directory, PairKind, PlanOptions, PlanStats, RenamePair, RenamePlan,
    TargetRegistry,
};
pub use scanner::{ensure_directory, scan, Candidate, RawSibling, Scan, ScanStats};
