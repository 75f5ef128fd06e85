pub mod archetype;
pub mod error;
pub mod naming;
pub mod registry;
pub mod rewrite;
pub mod scenario;
pub mod settings;

pub use archetype::{Archetypes, classify};
pub use error::{CoreError, CoreErrorCode};
pub use naming::{NamingConfig, compose_tag, compute_target_name, strip_known_tags};
pub use registry::{ArithmeticKind, Modifier, ModifierSpec, Scope, TagSuffix, fields};
pub use rewrite::{Disposition, PlannedVariant, VariantTask, apply, plan};
pub use scenario::{ParsedScenario, parse_file, parse_str};
pub use settings::{ModifierPrefs, Profile, Settings, ValueChoice};
