//! Default configuration values - single source of truth

/// Mode used when none is given
pub const MODE: &str = "inplace";

/// Tag substring that marks a protoc-gen-go struct field
pub const TAG_MARKER: &str = "protobuf:";

/// Whether to skip types that already declare the method
pub const SKIP_EXISTING: bool = false;

/// Whether to derive the destination from the source name in template mode
pub const COMPANION: bool = false;

/// Whether to run gofmt on a written destination file
pub const RUN_GOFMT: bool = false;

/// Whether to run in dry-run mode by default
pub const DRY_RUN: bool = false;

/// Import path of the JSON runtime the generated methods call
pub const RUNTIME_IMPORT_PATH: &str = "google.golang.org/protobuf/encoding/protojson";

/// Package name the runtime is referenced by
pub const RUNTIME_PACKAGE: &str = "protojson";

/// Runtime function taking the message and returning `([]byte, error)`
pub const RUNTIME_ENTRY_POINT: &str = "Marshal";

/// Name of the generated method
pub const METHOD_NAME: &str = "MarshalJSON";

/// Receiver variable of the generated method
pub const RECEIVER_NAME: &str = "m";

/// Import path of the jsonpb wrapper for github.com/golang/protobuf messages
pub const JSONPB_IMPORT_PATH: &str = "github.com/ajm188/go-jsonpb";

/// Package name of the jsonpb wrapper
pub const JSONPB_PACKAGE: &str = "jsonpb";
