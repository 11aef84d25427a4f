//! Global options and per-fragment option resolution.
//!
//! Options arrive as one global object mapping fragment names to toggles:
//! 1. **Absent** - the fragment's own default enablement applies
//! 2. **`false`** - disabled
//! 3. **`true`** - enabled with the fragment's defaults
//! 4. **object** - enabled with defaults shallow-merged under the object
//!
//! ## Config files
//! [`ConfigLoader`] reads the global object from YAML tiers and deep-merges them:
//! - Project: `$RULESTACK_PROJECT_DIR/rulestack.yaml` (default: current directory)
//! - User: `$RULESTACK_USER_DIR/config.yaml` (default: `~/.rulestack/`)
//!
//! ## Environment Variables
//! - `RULESTACK_CONFIG_PATH` - Explicit config file (overrides all tiers)
//! - `RULESTACK_AUTO_RENAME` - `0`/`false` disables plugin renaming
//! - `RULESTACK_GITIGNORE` - `0`/`false` disables `.gitignore` discovery

mod global;
mod loader;
mod merge;
mod resolver;
mod toggle;

pub use global::{GlobalOptions, ProjectType};
pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all, shallow_merge};
pub use resolver::{Facts, FragmentDescriptor, decode, resolve, resolve_all, to_record};
pub use toggle::Toggle;
