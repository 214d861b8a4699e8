//! Resolved runtime flags.
//!
//! Flags are named the way they appear on the VM command line
//! (`PrintFlagsFinal`, `MaxHeapSize`, ...), and that is
//! also their spelling in JSON flags files. Missing keys fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::io::{self, Write};

/// The complete set of flags consumed by the bootstrap and its hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default, deny_unknown_fields)]
pub struct RuntimeFlags {
    /// Dump every resolved flag once phase 2 succeeds
    pub print_flags_final: bool,
    /// Print safepoint statistics at shutdown
    pub print_safepoint_statistics: bool,
    /// Print symbol and string table statistics at shutdown
    pub print_string_table_statistics: bool,
    /// Code cache reservation, in bytes
    pub reserved_code_cache_size: u64,
    /// Maximum heap size, in bytes
    pub max_heap_size: u64,
    /// Whether the compiler broker starts compiler threads
    pub use_compiler: bool,
}

impl Default for RuntimeFlags {
    fn default() -> Self {
        Self {
            print_flags_final: false,
            print_safepoint_statistics: false,
            print_string_table_statistics: false,
            reserved_code_cache_size: 240 * 1024 * 1024,
            max_heap_size: 256 * 1024 * 1024,
            use_compiler: true,
        }
    }
}

impl RuntimeFlags {
    /// Parses a JSON flags document.
    pub fn from_json_str(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }

    /// Prints every flag, sorted by name, in the `PrintFlagsFinal` layout.
    ///
    /// ```text
    /// [Global flags]
    ///      bool PrintFlagsFinal                           = true                 {product}
    /// ```
    pub fn print_flags(&self, out: &mut dyn Write) -> io::Result<()> {
        let value = serde_json::to_value(self).map_err(io::Error::other)?;
        let JsonValue::Object(map) = value else {
            return Err(io::Error::other("flags did not serialize to an object"));
        };

        let mut entries: Vec<_> = map.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        writeln!(out, "[Global flags]")?;
        for (name, value) in entries {
            let kind = match &value {
                JsonValue::Bool(_) => "bool",
                JsonValue::Number(_) => "uintx",
                _ => "ccstr",
            };
            writeln!(out, "{kind:>9} {name:<41} = {:<20} {{product}}", value.to_string())?;
        }
        Ok(())
    }
}
